use crate::models::errors::TraceError;
use crate::models::trace::{Call, CallKind, Log, RawCall, RawLog};
use crate::utils::hex_to_u256;

pub trait TraceParser {
    fn parse_trace(self) -> Result<Call, TraceError>;
}

impl TraceParser for RawCall {
    // Shape is preserved: one Call per RawCall, children in order
    fn parse_trace(self) -> Result<Call, TraceError> {
        let value = self
            .value
            .as_deref()
            .map(|value| hex_to_u256("value", value))
            .transpose()?;

        let logs = self
            .logs
            .into_iter()
            .map(parse_log)
            .collect::<Result<Vec<_>, _>>()?;

        let calls = self
            .calls
            .into_iter()
            .map(TraceParser::parse_trace)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Call {
            kind: CallKind::from_tracer_type(&self.r#type),
            from: self.from,
            to: self.to,
            value,
            gas: hex_to_u256("gas", &self.gas)?,
            gas_used: hex_to_u256("gasUsed", &self.gas_used)?,
            input: self.input,
            output: self.output,
            error: self.error,
            revert_reason: self.revert_reason,
            logs,
            calls,
        })
    }
}

fn parse_log(log: RawLog) -> Result<Log, TraceError> {
    Ok(Log {
        position: log
            .position
            .as_deref()
            .map(|position| hex_to_u256("position", position))
            .transpose()?,
        address: log.address,
        topics: log.topics,
        data: log.data,
    })
}

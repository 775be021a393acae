//! Minimal logging seam used at the decision points worth surfacing to an
//! operator: version mismatches, dropped flows, struct-field caps, and
//! expired or superseded transactions.
//!
//! Behind the `logwise` feature, records are forwarded to the `logwise`
//! crate; otherwise they go to stderr. Decoding itself must never depend on
//! a logging framework being present, so every call site in this crate goes
//! through [`debug`] or [`warn`] rather than calling `logwise` directly.

/// Logs a debug-level diagnostic.
///
/// Used for conditions that are expected and handled but still worth
/// surfacing during investigation — e.g. a strict-header version mismatch
/// that the message-begin decoder proceeds past anyway.
pub fn debug(message: &str) {
    #[cfg(feature = "logwise")]
    {
        logwise::debug_sync!("{message}", message = message);
    }
    #[cfg(not(feature = "logwise"))]
    {
        eprintln!("[thrift_sniff][debug] {}", message);
    }
}

/// Logs a warning.
///
/// Used when the decoder drops a flow, discards a reply, or otherwise takes
/// a corrective action that an operator should be able to see in aggregate
/// without it being fatal to the process.
pub fn warn(message: &str) {
    #[cfg(feature = "logwise")]
    {
        logwise::warn_sync!("{message}", message = message);
    }
    #[cfg(not(feature = "logwise"))]
    {
        eprintln!("[thrift_sniff][warn] {}", message);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn logging_does_not_panic() {
        debug("decoding suspended, awaiting more bytes");
        warn("flow exceeded tcp_max_data_in_stream, dropping");
    }
}

use hickory_proto::op::ResponseCode;

/// The decision produced by a rule.
///
/// `Noop` means the rule did not decide and the next rule should be
/// consulted. Every decision site matches exhaustively; there is no
/// open-ended verdict type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Let the request pass to the next middleware.
    Accept,

    /// Answer the request with the given rcode and no records.
    Reject { code: ResponseCode },

    /// Raise the request's evil mark and attach labels, then pass.
    Mark { amount: i64, labels: Vec<String> },

    /// Redirect the request to a fixed destination address.
    Sinkhole { destination: String },

    /// No decision; try the next rule.
    Noop,
}

impl Verdict {
    /// The conventional reject verdict: `REFUSED`, no records.
    pub fn reject() -> Self {
        Verdict::Reject {
            code: ResponseCode::Refused,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Verdict::Noop)
    }

    /// Chain defaults must decide; a `Noop` default decays to `Accept`.
    pub fn or_accept(self) -> Self {
        if self.is_noop() {
            Verdict::Accept
        } else {
            self
        }
    }
}

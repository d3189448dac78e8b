use hickory_proto::op::{Message, ResponseCode};

/// The reply to a DNS query plus metadata about who produced it.
///
/// Once attached to a session the response is owned by that session until it
/// is written; on-complete hooks rewrite it in place through `message_mut`.
#[derive(Debug, Clone)]
pub struct Response {
    msg: Message,
    served_by: Option<String>,
    handler: Option<String>,
    comment: Option<String>,
}

impl Response {
    pub fn new(msg: Message) -> Self {
        Self {
            msg,
            served_by: None,
            handler: None,
            comment: None,
        }
    }

    /// Records the upstream address or zone that served the request.
    pub fn with_served_by(mut self, served_by: impl Into<String>) -> Self {
        self.served_by = Some(served_by.into());
        self
    }

    /// Records the middleware that produced this response.
    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn message(&self) -> &Message {
        &self.msg
    }

    pub fn message_mut(&mut self) -> &mut Message {
        &mut self.msg
    }

    pub fn served_by(&self) -> Option<&str> {
        self.served_by.as_deref()
    }

    pub fn handler(&self) -> Option<&str> {
        self.handler.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// Conventional mnemonic for an rcode, for logs and persisted records.
pub fn rcode_name(code: ResponseCode) -> &'static str {
    match code {
        ResponseCode::NoError => "NOERROR",
        ResponseCode::FormErr => "FORMERR",
        ResponseCode::ServFail => "SERVFAIL",
        ResponseCode::NXDomain => "NXDOMAIN",
        ResponseCode::NotImp => "NOTIMP",
        ResponseCode::Refused => "REFUSED",
        ResponseCode::YXDomain => "YXDOMAIN",
        ResponseCode::YXRRSet => "YXRRSET",
        ResponseCode::NXRRSet => "NXRRSET",
        ResponseCode::NotAuth => "NOTAUTH",
        ResponseCode::NotZone => "NOTZONE",
        _ => "OTHER",
    }
}

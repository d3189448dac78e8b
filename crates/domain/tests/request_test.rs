use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use palisade_dns_domain::Request;

fn query_message(name: &str, rtype: RecordType) -> Message {
    let mut msg = Message::new();
    msg.set_id(0x1234)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);

    let mut query = Query::query(Name::from_utf8(name).unwrap(), rtype);
    query.set_query_class(DNSClass::IN);
    msg.add_query(query);
    msg
}

fn make_request(name: &str, rtype: RecordType) -> Request {
    Request::new(query_message(name, rtype), "192.0.2.1:53000".parse().unwrap()).unwrap()
}

#[test]
fn test_rejects_message_without_question() {
    let msg = Message::new();
    assert!(Request::new(msg, "192.0.2.1:53000".parse().unwrap()).is_err());
}

#[test]
fn test_name_is_lowercased_and_fully_qualified() {
    let request = make_request("WWW.Example.COM.", RecordType::A);
    assert_eq!(request.name().to_string(), "www.example.com.");
}

#[test]
fn test_question_accessors() {
    let request = make_request("example.com.", RecordType::AAAA);
    assert_eq!(request.query_class(), DNSClass::IN);
    assert_eq!(request.query_type(), RecordType::AAAA);
    assert_eq!(request.client_ip().to_string(), "192.0.2.1");
    assert_eq!(request.client_port(), 53000);
}

#[test]
fn test_mark_accumulates() {
    let mut request = make_request("example.com.", RecordType::A);
    assert_eq!(request.mark(), 0);
    request.add_mark(2);
    request.add_mark(3);
    assert_eq!(request.mark(), 5);
}

#[test]
fn test_labels_deduplicate() {
    let mut request = make_request("example.com.", RecordType::A);
    request.add_labels(["suspicious", "tracked"]);
    request.add_labels(["suspicious"]);
    assert_eq!(request.labels().count(), 2);
    assert!(request.has_label("suspicious"));
    assert!(request.has_label("tracked"));
}

#[test]
fn test_reply_echoes_id_and_question() {
    let request = make_request("example.com.", RecordType::A);
    let reply = request.reply(ResponseCode::Refused);

    assert_eq!(reply.id(), 0x1234);
    assert_eq!(reply.message_type(), MessageType::Response);
    assert_eq!(reply.response_code(), ResponseCode::Refused);
    assert_eq!(reply.queries().len(), 1);
    assert!(reply.answers().is_empty());
}

use hickory_proto::op::Message;
use hickory_proto::rr::dnssec::rdata::tsig::TSIG;
use hickory_proto::rr::dnssec::rdata::DNSSECRData;
use hickory_proto::rr::{DNSClass, RData, Record, RecordType};
use std::time::{SystemTime, UNIX_EPOCH};

fn find_tsig(msg: &Message) -> Option<(&Record, &TSIG)> {
    msg.additionals().iter().find_map(|record| {
        if record.record_type() != RecordType::TSIG {
            return None;
        }
        match record.data() {
            Some(RData::DNSSEC(DNSSECRData::TSIG(tsig))) => Some((record, tsig)),
            _ => None,
        }
    })
}

/// If the inbound request was TSIG-signed and the outgoing response is not,
/// attach a TSIG stub carrying the request's key name and algorithm and the
/// current unix time. The transport writer performs the actual signing.
pub(super) fn attach_passthrough(request: &Message, response: &mut Message) {
    let Some((record, request_tsig)) = find_tsig(request) else {
        return;
    };
    if find_tsig(response).is_some() {
        return;
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);

    let tsig = TSIG::new(
        request_tsig.algorithm().clone(),
        now,
        request_tsig.fudge(),
        Vec::new(),
        request.id(),
        0,
        Vec::new(),
    );

    let mut rr = Record::from_rdata(
        record.name().clone(),
        0,
        RData::DNSSEC(DNSSECRData::TSIG(tsig)),
    );
    rr.set_dns_class(DNSClass::ANY);
    response.add_additional(rr);
}

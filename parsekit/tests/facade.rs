use chrono::{TimeZone, Utc};
use parsekit::{serialize_constraints, to_native, to_wire, ConstraintSet, OrderList, Value};

#[test]
fn core_codec_is_reexported() {
    let date = Utc.with_ymd_and_hms(2012, 5, 6, 7, 8, 9).unwrap();
    let wire = to_wire(&Value::Date(date)).unwrap();
    assert_eq!(wire["__type"], "Date");
    assert_eq!(wire["iso"], "2012-05-06T07:08:09.000Z");
    assert_eq!(to_native(&wire).unwrap(), Value::Date(date));

    let query = serialize_constraints(&ConstraintSet::new(), &OrderList::new(), 5, 0).unwrap();
    assert_eq!(query, "limit=5");
}

#[cfg(feature = "rest")]
#[test]
fn rest_client_is_reexported() {
    let client = parsekit::ParseClient::builder()
        .application_id("app")
        .api_key("key")
        .tag_hook(parsekit::ParseTypes)
        .build()
        .unwrap();
    assert_eq!(client.base_url(), parsekit::rest::client::DEFAULT_BASE_URL);
    assert_eq!(client.object("GameScore").class_name(), "GameScore");
}

//! Integration tests for armature-representation

use armature_representation::*;
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::io::{self, Read};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Ticket {
    code: String,
    note: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u64,
    item: String,
    quantity: u32,
    paid: bool,
}

/// Inbound representation that records how often its stream was opened.
struct CountingRepresentation {
    media_type: MediaType,
    body: Vec<u8>,
    opened: Rc<Cell<usize>>,
}

impl CountingRepresentation {
    fn new(media_type: MediaType, body: &[u8]) -> (Self, Rc<Cell<usize>>) {
        let opened = Rc::new(Cell::new(0));
        let repr = Self {
            media_type,
            body: body.to_vec(),
            opened: Rc::clone(&opened),
        };
        (repr, opened)
    }
}

impl Representation for CountingRepresentation {
    fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    fn stream(&mut self) -> io::Result<Box<dyn Read + '_>> {
        self.opened.set(self.opened.get() + 1);
        Ok(Box::new(&self.body[..]))
    }
}

/// Inbound representation whose stream always fails.
struct BrokenRepresentation(MediaType);

impl Representation for BrokenRepresentation {
    fn media_type(&self) -> &MediaType {
        &self.0
    }

    fn stream(&mut self) -> io::Result<Box<dyn Read + '_>> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"))
    }
}

// =============================================================================
// Concrete scenarios
// =============================================================================

#[test]
fn test_scott_roundtrip() {
    let mut outbound = SerdeRepresentation::new(
        MediaType::application_json(),
        User {
            name: "scott".to_string(),
        },
    );
    let mut sink = Vec::new();
    outbound.write(&mut sink).unwrap();
    assert_eq!(sink, br#"{"name":"scott"}"#);

    let inbound = BytesRepresentation::new(MediaType::application_json(), sink);
    let mut repr = SerdeRepresentation::<User>::from_representation(inbound);
    assert_eq!(repr.value().unwrap().name, "scott");
}

#[test]
fn test_malformed_json_fails() {
    let inbound = BytesRepresentation::from_static(MediaType::application_json(), br#"{"name":"#);
    let mut repr = SerdeRepresentation::<User>::from_representation(inbound);

    let err = repr.value().unwrap_err();
    assert!(matches!(err, RepresentationError::Decode { .. }));

    let io_err: io::Error = err.into();
    assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
}

#[test]
fn test_stream_failure_is_io_error() {
    let mut repr = SerdeRepresentation::<User>::from_representation(BrokenRepresentation(
        MediaType::application_json(),
    ));
    match repr.value() {
        Err(RepresentationError::Io(err)) => {
            assert_eq!(err.kind(), io::ErrorKind::ConnectionReset)
        }
        other => panic!("expected IO error, got {:?}", other.map(|_| ())),
    }
}

// =============================================================================
// Value / stream exclusivity
// =============================================================================

#[test]
fn test_value_held_never_reads_stream() {
    let user = User {
        name: "scott".to_string(),
    };
    let (counting, opened) = CountingRepresentation::new(MediaType::application_json(), b"{}");

    let mut repr = SerdeRepresentation::json(user.clone());
    assert_eq!(repr.value().unwrap(), &user);
    assert_eq!(repr.held_value(), Some(&user));
    assert!(!repr.has_stream());

    // The stream is only opened when an adapter built from it decodes
    let mut inbound = SerdeRepresentation::<User>::from_representation(counting);
    assert_eq!(opened.get(), 0);
    inbound.set_value(user.clone());
    assert_eq!(inbound.value().unwrap(), &user);
    assert_eq!(opened.get(), 0);
}

#[test]
fn test_stream_is_read_once() {
    let (counting, opened) =
        CountingRepresentation::new(MediaType::application_json(), br#"{"name":"tiger"}"#);
    let mut repr = SerdeRepresentation::<User>::from_representation(counting);

    assert_eq!(repr.value().unwrap().name, "tiger");
    assert_eq!(repr.value().unwrap().name, "tiger");
    assert_eq!(opened.get(), 1);
}

#[test]
fn test_failed_decode_is_not_retried() {
    let (counting, opened) = CountingRepresentation::new(MediaType::application_json(), b"[");
    let mut repr = SerdeRepresentation::<User>::from_representation(counting);

    assert!(repr.value().is_err());
    assert!(matches!(repr.value(), Err(RepresentationError::Consumed)));
    assert_eq!(opened.get(), 1);
}

// =============================================================================
// Lazy codecs and overrides
// =============================================================================

#[test]
fn test_fallback_mapper_for_unknown_media_type() {
    let unknown = MediaType::parse("application/x-unknown").unwrap();
    let mut repr = SerdeRepresentation::new(
        unknown,
        User {
            name: "scott".to_string(),
        },
    );

    let mapper = repr.mapper().unwrap();
    assert_eq!(mapper.format(), WireFormat::FallbackJson);
    assert_eq!(&repr.to_bytes().unwrap()[..], br#"{"name":"scott"}"#);
}

#[test]
fn test_mapper_override_is_not_rebuilt() {
    let custom = Mapper::new(WireFormat::Json).with_pretty(true);
    let mut repr = SerdeRepresentation::new(
        MediaType::application_xml(),
        User {
            name: "scott".to_string(),
        },
    );
    repr.set_mapper(custom.clone());

    let first = repr.mapper().unwrap() as *const Mapper;
    let second = repr.mapper().unwrap() as *const Mapper;
    assert_eq!(first, second);
    assert_eq!(repr.mapper().unwrap(), &custom);
    assert_eq!(
        &repr.to_bytes().unwrap()[..],
        b"{\n  \"name\": \"scott\"\n}"
    );
}

#[test]
fn test_configured_adapter() {
    let config = CodecConfig::from_toml_str("xml_root = \"account\"\npretty = false").unwrap();
    let mut repr = SerdeRepresentation::new(
        MediaType::text_xml(),
        User {
            name: "scott".to_string(),
        },
    )
    .with_config(config);

    assert_eq!(
        &repr.to_bytes().unwrap()[..],
        b"<account><name>scott</name></account>"
    );
}

// =============================================================================
// Writing
// =============================================================================

#[test]
fn test_pass_through_copies_bytes_verbatim() {
    // Not valid JSON: no encoder may touch it
    let body: &'static [u8] = b"\x00\xffnot { json";
    let inbound = BytesRepresentation::from_static(MediaType::application_json(), body);
    let mut repr = SerdeRepresentation::<User>::from_representation(inbound);

    let mut sink = Vec::new();
    let written = repr.write(&mut sink).unwrap();
    assert_eq!(sink, body);
    assert_eq!(written, body.len() as u64);
    assert!(repr.writer().is_ok());
}

#[test]
fn test_pass_through_from_stream() {
    let inbound = StreamRepresentation::new(MediaType::text_csv(), &b"a,b\n1,2\n"[..]);
    let mut repr = SerdeRepresentation::<Vec<Order>>::from_representation(inbound);

    let mut sink = Vec::new();
    repr.write(&mut sink).unwrap();
    assert_eq!(sink, b"a,b\n1,2\n");
}

#[test]
fn test_sink_stays_open_across_writes() {
    let mut sink = Vec::new();
    let mut first = SerdeRepresentation::json(User {
        name: "scott".to_string(),
    });
    let mut second = SerdeRepresentation::json(User {
        name: "tiger".to_string(),
    });

    first.write(&mut sink).unwrap();
    sink.push(b'\n');
    second.write(&mut sink).unwrap();

    assert_eq!(sink, b"{\"name\":\"scott\"}\n{\"name\":\"tiger\"}");
}

#[test]
fn test_csv_orders() {
    let orders = vec![
        Order {
            id: 1,
            item: "widget".to_string(),
            quantity: 3,
            paid: true,
        },
        Order {
            id: 2,
            item: "gadget, large".to_string(),
            quantity: 1,
            paid: false,
        },
    ];

    let mut outbound = SerdeRepresentation::new(MediaType::text_csv(), orders.clone());
    let body = outbound.to_bytes().unwrap();
    assert_eq!(
        &body[..],
        b"id,item,quantity,paid\n1,widget,3,true\n2,\"gadget, large\",1,false\n"
    );

    let decoded = SerdeRepresentation::<Vec<Order>>::from_representation(
        BytesRepresentation::new(MediaType::text_csv(), body),
    )
    .into_value()
    .unwrap();
    assert_eq!(decoded, orders);
}

#[test]
fn test_csv_cells_keep_their_field_types() {
    let tickets = vec![
        Ticket {
            code: "007".to_string(),
            note: Some(1),
        },
        Ticket {
            code: "abc".to_string(),
            note: None,
        },
    ];

    let mut outbound = SerdeRepresentation::new(MediaType::text_csv(), tickets.clone());
    let body = outbound.to_bytes().unwrap();
    assert_eq!(&body[..], b"code,note\n007,1\nabc,\n");

    let decoded = SerdeRepresentation::<Vec<Ticket>>::from_representation(
        BytesRepresentation::new(MediaType::text_csv(), body),
    )
    .into_value()
    .unwrap();
    assert_eq!(decoded, tickets);
}

#[test]
fn test_csv_non_ascii_delimiter_is_rejected() {
    let tickets = vec![Ticket {
        code: "a".to_string(),
        note: Some(1),
    }];
    let config = CodecConfig::default().with_csv_delimiter('é');
    let mut repr = SerdeRepresentation::new(MediaType::text_csv(), tickets).with_config(config);

    let err = repr.to_bytes().unwrap_err();
    assert!(matches!(err, RepresentationError::Config(_)));
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn test_xml_sequence_needs_root_element() {
    let users = vec![
        User {
            name: "scott".to_string(),
        },
        User {
            name: "tiger".to_string(),
        },
    ];

    let mut bare = SerdeRepresentation::new(MediaType::application_xml(), users.clone());
    assert!(matches!(
        bare.to_bytes(),
        Err(RepresentationError::Encode {
            format: WireFormat::Xml,
            ..
        })
    ));

    let mut rooted = SerdeRepresentation::new(MediaType::application_xml(), users)
        .with_config(CodecConfig::default().with_xml_root("user"));
    let body = rooted.to_bytes().unwrap();
    let xml = String::from_utf8(body.to_vec()).unwrap();
    assert!(xml.contains("<user><name>tiger</name></user>"), "{}", xml);
}

// =============================================================================
// Round-trip properties
// =============================================================================

fn ticket_strategy() -> impl Strategy<Value = Ticket> {
    (any::<String>(), any::<Option<u32>>()).prop_map(|(code, note)| Ticket { code, note })
}

fn order_strategy() -> impl Strategy<Value = Order> {
    let item = "[a-zA-Z0-9]([a-zA-Z0-9.,;' -]{0,10}[a-zA-Z0-9])?";
    (any::<u64>(), item, any::<u32>(), any::<bool>()).prop_map(
        |(id, item, quantity, paid)| Order {
            id,
            item,
            quantity,
            paid,
        },
    )
}

proptest! {
    #[test]
    fn prop_roundtrip(
        order in order_strategy(),
        media_type in prop::sample::select(vec![
            "application/json",
            "application/msgpack",
            "application/xml",
            "application/yaml",
            "text/csv",
            "application/x-unknown",
        ]),
    ) {
        let media_type = MediaType::parse(media_type).unwrap();
        let mut outbound = SerdeRepresentation::new(media_type.clone(), order.clone());
        let body = outbound.to_bytes().unwrap();

        let decoded = SerdeRepresentation::<Order>::from_representation(
            BytesRepresentation::new(media_type, body),
        )
        .into_value()
        .unwrap();
        prop_assert_eq!(decoded, order);
    }

    #[test]
    fn prop_csv_roundtrip_any_text(tickets in prop::collection::vec(ticket_strategy(), 0..6)) {
        let mut outbound = SerdeRepresentation::new(MediaType::text_csv(), tickets.clone());
        let body = outbound.to_bytes().unwrap();

        let decoded = SerdeRepresentation::<Vec<Ticket>>::from_representation(
            BytesRepresentation::new(MediaType::text_csv(), body),
        )
        .into_value()
        .unwrap();
        prop_assert_eq!(decoded, tickets);
    }
}

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use proptest::prelude::*;
use shale::{Action, Deserializer, Object, Reflect, Serializer, Typed, Value};
use std::collections::{BTreeSet, HashMap, VecDeque};

#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
enum Color {
    #[default]
    Red,
    Green,
    Blue,
}

#[derive(Reflect, Clone, Debug, Default, PartialEq)]
struct Sample {
    a: i8,
    b: u8,
    c: i16,
    d: u16,
    e: i32,
    f: u32,
    g: i64,
    h: u64,
    flag: bool,
    ch: char,
    x: f32,
    y: f64,
    when: NaiveDateTime,
    span: TimeDelta,
    name: Option<String>,
    color: Color,
}

#[derive(Reflect, Clone, Debug, Default, PartialEq)]
#[shale(value_type, compact)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Reflect, Clone, Debug, Default, PartialEq)]
struct Node {
    value: i32,
}

#[derive(Reflect, Clone, Debug, Default, PartialEq)]
struct Pair {
    first: Node,
    second: Option<Node>,
}

#[derive(Reflect, Clone, Debug, Default, PartialEq)]
struct Containers {
    list: Vec<i32>,
    array: Box<[String]>,
    set: BTreeSet<u16>,
    deque: VecDeque<Color>,
    map: HashMap<String, Vec<u8>>,
    points: Vec<Point>,
    maybe_list: Option<Vec<i32>>,
    nested: Vec<Vec<Option<String>>>,
}

#[derive(Reflect, Clone, Debug, Default, PartialEq)]
struct Circle {
    r: f64,
}

#[derive(Reflect, Clone, Debug, Default, PartialEq)]
struct Square {
    side: f64,
}

#[derive(Reflect, Clone, Debug, Default, PartialEq)]
struct Scene {
    shapes: Vec<Box<dyn Object>>,
    #[shale(optional)]
    focus: Option<Box<dyn Object>>,
}

#[derive(Reflect, Clone, Debug, Default, PartialEq)]
struct Tagged {
    #[shale(optional)]
    label: Option<String>,
    n: i32,
}

#[derive(Reflect, Clone, Debug, Default, PartialEq)]
#[shale(after_deserialization = "compute")]
struct Rect {
    w: i32,
    h: i32,
    #[shale(skip)]
    area: i32,
}

impl Rect {
    fn compute(&mut self) {
        self.area = self.w * self.h;
    }
}

#[derive(Reflect, Clone, Debug, Default, PartialEq)]
#[shale(action = "bump")]
struct Counter {
    count: i32,
    #[shale(optional)]
    on_tick: Option<Action<i32>>,
}

impl Counter {
    fn bump(&mut self, by: i32) {
        self.count += by;
    }
}

#[derive(Reflect, Clone, Debug, Default, PartialEq)]
struct Bag {
    name: String,
    #[shale(merge)]
    items: Vec<i32>,
    #[shale(merge)]
    inner: Node,
}

fn round_trip<T: Typed>(value: &T) -> T {
    let bytes = shale::to_bytes(value).unwrap();
    shale::from_bytes(&bytes).unwrap()
}

#[test]
fn atoms() {
    let sample = Sample {
        a: -5,
        b: 250,
        c: -30000,
        d: 60000,
        e: -1,
        f: 4_000_000_000,
        g: i64::MIN,
        h: u64::MAX,
        flag: true,
        ch: 'ы',
        x: 1.5,
        y: -0.25,
        when: NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_micro_opt(12, 30, 15, 123_456)
            .unwrap(),
        span: TimeDelta::milliseconds(-90_061_001),
        name: Some("sample".into()),
        color: Color::Blue,
    };
    assert_eq!(round_trip(&sample), sample);
    assert_eq!(round_trip(&Sample::default()), Sample::default());
}

#[test]
fn record_layout() {
    let bytes = shale::to_bytes(&Node { value: 7 }).unwrap();
    #[rustfmt::skip]
    let expected = [
        32, // Record
        1, 0, // class id
        4, b'N', b'o', b'd', b'e', 1, 0, // name, field count
        5, b'v', b'a', b'l', b'u', b'e', 5, // field name, Int
        1, 0, 7, 0, 0, 0, // slot 1
        0, 0, // end of object
    ];
    assert_eq!(bytes, expected);
}

#[test]
fn compact_layout() {
    let bytes = shale::to_bytes(&Point { x: 1, y: 2 }).unwrap();
    #[rustfmt::skip]
    let expected = [
        32, 1, 0,
        5, b'P', b'o', b'i', b'n', b't', 2, 0,
        1, b'x', 5,
        1, b'y', 5,
        1, 0, 0, 0,
        2, 0, 0, 0,
    ];
    assert_eq!(bytes, expected);
    assert_eq!(shale::from_bytes::<Point>(&bytes).unwrap(), Point { x: 1, y: 2 });
}

#[test]
fn enums_by_position() {
    assert_eq!(shale::to_bytes(&Color::Blue).unwrap(), [5, 2, 0, 0, 0]);
    assert_eq!(round_trip(&Color::Green), Color::Green);
}

#[test]
fn containers() {
    let containers = Containers {
        list: vec![1, -2, 3],
        array: vec!["a".to_string(), String::new()].into_boxed_slice(),
        set: [3, 1, 2].into(),
        deque: [Color::Blue, Color::Red].into(),
        map: [("k".to_string(), vec![1, 2]), ("e".to_string(), vec![])].into(),
        points: vec![Point { x: 1, y: 2 }, Point { x: -3, y: 4 }],
        maybe_list: None,
        nested: vec![vec![Some("x".into()), None], vec![]],
    };
    assert_eq!(round_trip(&containers), containers);

    let with_list = Containers {
        maybe_list: Some(vec![]),
        ..Default::default()
    };
    assert_eq!(round_trip(&with_list), with_list);
}

#[test]
fn null_discrimination() {
    assert_eq!(
        shale::to_bytes(&None::<Vec<i32>>).unwrap(),
        [33, 5, 0xFF, 0xFF, 0xFF, 0xFF]
    );
    assert_eq!(
        shale::to_bytes(&Some(Vec::<i32>::new())).unwrap(),
        [33, 5, 0, 0, 0, 0]
    );
    assert_eq!(shale::to_bytes(&None::<String>).unwrap(), [16, 0, 1]);
    assert_eq!(shale::to_bytes(&Some(String::new())).unwrap(), [16, 0, 0]);
    assert_eq!(shale::to_bytes(&None::<Node>).unwrap(), [32, 0, 0]);

    assert_eq!(round_trip(&None::<Vec<i32>>), None);
    assert_eq!(round_trip(&Some(Vec::<i32>::new())), Some(vec![]));
    assert_eq!(round_trip(&None::<String>), None);
    assert_eq!(round_trip(&Some(String::new())), Some(String::new()));
    assert_eq!(round_trip(&None::<HashMap<String, i32>>), None);
    assert_eq!(round_trip(&None::<Box<[u8]>>), None);
    assert_eq!(round_trip(&None::<Node>), None);
}

#[test]
fn null_struct_is_default() {
    assert_eq!(shale::from_bytes::<Point>(&[32, 0, 0]).unwrap(), Point::default());
}

#[test]
fn class_id_reuse() {
    let pair = Pair {
        first: Node { value: 1 },
        second: Some(Node { value: 2 }),
    };
    let bytes = shale::to_bytes(&pair).unwrap();
    let definitions = bytes.windows(5).filter(|w| *w == b"\x04Node").count();
    assert_eq!(definitions, 1);
    assert_eq!(shale::from_bytes::<Pair>(&bytes).unwrap(), pair);

    let half = Pair {
        second: None,
        ..pair
    };
    assert_eq!(round_trip(&half), half);
}

#[test]
fn polymorphic_records() {
    let scene = Scene {
        shapes: vec![
            Box::new(Circle { r: 1.0 }) as Box<dyn Object>,
            Box::new(Square { side: 2.0 }),
            Box::new(Circle { r: 3.0 }),
        ],
        focus: Some(Box::new(Square { side: 4.0 })),
    };
    let bytes = shale::to_bytes(&scene).unwrap();
    let de = Deserializer::default().with::<Circle>().with::<Square>();
    let decoded: Scene = de.from_bytes(&bytes).unwrap();
    assert_eq!(decoded, scene);
    let circle = decoded.shapes[2].as_any().downcast_ref::<Circle>().unwrap();
    assert_eq!(circle.r, 3.0);
}

#[test]
fn optional_defaults_are_omitted() {
    let bytes = shale::to_bytes(&Tagged { label: None, n: 3 }).unwrap();
    assert!(bytes.ends_with(&[2, 0, 3, 0, 0, 0, 0, 0]));
    assert_eq!(
        shale::from_bytes::<Tagged>(&bytes).unwrap(),
        Tagged { label: None, n: 3 }
    );

    let labelled = Tagged {
        label: Some("l".into()),
        n: 0,
    };
    assert_eq!(round_trip(&labelled), labelled);
}

#[test]
fn hooks_run_after_fields() {
    let decoded = round_trip(&Rect { w: 3, h: 4, area: 0 });
    assert_eq!(decoded.area, 12);
}

#[test]
fn actions_bind_to_owner() {
    let bump = Counter::meta().method("bump").unwrap();
    let counter = Counter {
        count: 1,
        on_tick: Some(Action::new("bump", bump.invoke)),
    };
    let mut decoded = round_trip(&counter);
    assert_eq!(decoded, counter);

    let action = decoded.on_tick.clone().unwrap();
    assert_eq!(action.name(), "bump");
    action.call(&mut decoded, 5).unwrap();
    assert_eq!(decoded.count, 6);

    assert_eq!(round_trip(&Counter::default()), Counter::default());
}

#[test]
fn merge_only_fields() {
    let bag = Bag {
        name: "b".into(),
        items: vec![1, 2],
        inner: Node { value: 5 },
    };
    let bytes = shale::to_bytes(&bag).unwrap();
    assert_eq!(shale::from_bytes::<Bag>(&bytes).unwrap(), bag);

    let mut existing = Bag {
        name: "old".into(),
        items: vec![0],
        inner: Node { value: 1 },
    };
    Deserializer::default()
        .merge_into(bytes.as_slice(), &mut existing)
        .unwrap();
    assert_eq!(existing.name, "b");
    assert_eq!(existing.items, [0, 1, 2]);
    assert_eq!(existing.inner, Node { value: 5 });
}

#[test]
fn merge_into_collections() {
    let bytes = shale::to_bytes(&vec![3, 4]).unwrap();
    let mut list = vec![1, 2];
    Deserializer::default()
        .merge_into(bytes.as_slice(), &mut list)
        .unwrap();
    assert_eq!(list, [1, 2, 3, 4]);

    let bytes = shale::to_bytes(&HashMap::from([(2u8, true)])).unwrap();
    let mut map = HashMap::from([(1u8, false)]);
    Deserializer::default()
        .merge_into(bytes.as_slice(), &mut map)
        .unwrap();
    assert_eq!(map, HashMap::from([(1, false), (2, true)]));
}

#[test]
fn untyped_values() {
    let value = Value::Seq(vec![
        Value::I32(1),
        Value::String("a".into()),
        Value::Null,
        Value::Map(vec![(Value::U8(1), Value::Seq(vec![Value::F64(0.5)]))]),
        Node { value: 9 }.to_value(),
    ]);
    let mut bytes = Vec::new();
    Serializer::default().write_value(&value, &mut bytes).unwrap();
    let de = Deserializer::default().with::<Node>();
    assert_eq!(de.read_any(bytes.as_slice()).unwrap(), value);
    assert_eq!(de.from_bytes::<Value>(&bytes).unwrap(), value);
}

#[test]
fn untyped_field() {
    #[derive(Reflect, Clone, Debug, Default, PartialEq)]
    struct Holder {
        payload: Value,
    }

    let holder = Holder {
        payload: Value::Seq(vec![Value::Bool(true), Value::Char('c')]),
    };
    assert_eq!(round_trip(&holder), holder);
}

#[test]
fn consecutive_values() {
    let ser = Serializer::default();
    let mut out = Vec::new();
    ser.to_writer(&Node { value: 1 }, &mut out).unwrap();
    ser.to_writer(&Node { value: 2 }, &mut out).unwrap();
    ser.to_writer(&"tail".to_string(), &mut out).unwrap();

    let de = Deserializer::default();
    let mut input = out.as_slice();
    assert_eq!(de.from_reader::<Node, _>(&mut input).unwrap().value, 1);
    assert_eq!(de.from_reader::<Node, _>(&mut input).unwrap().value, 2);
    assert_eq!(de.from_reader::<String, _>(&mut input).unwrap(), "tail");
    assert!(input.is_empty());
}

proptest! {
    #[test]
    fn strings_round_trip(s in ".*") {
        prop_assert_eq!(round_trip(&s), s);
    }

    #[test]
    fn integers_round_trip(a: i64, b: u16, c: i8, d: u32) {
        prop_assert_eq!(round_trip(&a), a);
        prop_assert_eq!(round_trip(&b), b);
        prop_assert_eq!(round_trip(&c), c);
        prop_assert_eq!(round_trip(&d), d);
    }

    #[test]
    fn floats_round_trip(x in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
        prop_assert_eq!(round_trip(&x), x);
    }

    #[test]
    fn chars_round_trip(c: char) {
        prop_assert_eq!(round_trip(&c), c);
    }

    #[test]
    fn date_times_round_trip(secs in -62_135_596_800i64..253_402_300_799, ticks in 0u32..10_000_000) {
        let dt = DateTime::from_timestamp(secs, ticks * 100).unwrap().naive_utc();
        prop_assert_eq!(round_trip(&dt), dt);
    }

    #[test]
    fn lists_round_trip(list in proptest::collection::vec(any::<i16>(), 0..64)) {
        prop_assert_eq!(round_trip(&list), list);
    }
}

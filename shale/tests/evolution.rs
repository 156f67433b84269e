use shale::{Deserializer, ErrorKind, Options, Reflect, Serializer};

mod v1 {
    use shale::Reflect;

    #[derive(Reflect, Clone, Debug, Default, PartialEq)]
    #[shale(name = "Item")]
    pub struct Item {
        pub x: i32,
        pub y: i32,
    }

    #[derive(Reflect, Clone, Debug, Default, PartialEq)]
    #[shale(name = "Doc")]
    pub struct Doc {
        #[shale(rename = "Name")]
        pub name: String,
        #[shale(rename = "Count")]
        pub count: i32,
        #[shale(rename = "Tags")]
        pub tags: Vec<String>,
    }

    #[derive(Reflect, Clone, Debug, Default, PartialEq)]
    #[shale(name = "Abc")]
    pub struct Abc {
        #[shale(rename = "A")]
        pub a: i32,
        #[shale(rename = "B")]
        pub b: Vec<String>,
        #[shale(rename = "C")]
        pub c: i32,
    }

    #[derive(Reflect, Clone, Debug, Default, PartialEq)]
    #[shale(name = "Sparse")]
    pub struct Sparse {
        pub b: i32,
        pub d: i32,
    }

    #[derive(Reflect, Clone, Debug, Default, PartialEq)]
    #[shale(name = "Node")]
    pub struct Node {
        pub value: i32,
    }

    #[derive(Reflect, Clone, Debug, Default, PartialEq)]
    #[shale(name = "Holder")]
    pub struct Holder {
        pub extra: Node,
        pub keep: u8,
    }
}

mod v2 {
    use shale::Reflect;

    // Optional field added.
    #[derive(Reflect, Clone, Debug, Default, PartialEq)]
    #[shale(name = "Item")]
    pub struct Item {
        pub x: i32,
        pub y: i32,
        #[shale(optional)]
        pub z: i32,
    }

    #[derive(Reflect, Clone, Debug, Default, PartialEq)]
    #[shale(name = "Doc")]
    pub struct Doc {
        #[shale(rename = "Name")]
        pub name: String,
        #[shale(rename = "Count")]
        pub count: i32,
        #[shale(rename = "Tags")]
        pub tags: Vec<String>,
        #[shale(rename = "Flag", optional)]
        pub flag: bool,
    }

    // Field B removed.
    #[derive(Reflect, Clone, Debug, Default, PartialEq)]
    #[shale(name = "Abc")]
    pub struct Abc {
        #[shale(rename = "A")]
        pub a: i32,
        #[shale(rename = "C")]
        pub c: i32,
    }

    // Optional fields around the written ones.
    #[derive(Reflect, Clone, Debug, Default, PartialEq)]
    #[shale(name = "Sparse")]
    pub struct Sparse {
        #[shale(optional)]
        pub a: Option<String>,
        pub b: i32,
        #[shale(optional)]
        pub c: Vec<u8>,
        pub d: i32,
        #[shale(optional)]
        pub e: bool,
    }

    #[derive(Reflect, Clone, Debug, Default, PartialEq)]
    #[shale(name = "Holder")]
    pub struct Holder {
        pub keep: u8,
    }
}

mod v2_required {
    use shale::Reflect;

    // Required field added.
    #[derive(Reflect, Clone, Debug, Default, PartialEq)]
    #[shale(name = "Item")]
    pub struct Item {
        pub x: i32,
        pub y: i32,
        pub z: i32,
    }
}

fn ignoring() -> Deserializer {
    Deserializer::new(Options::default().ignore_unknown_fields(true))
}

#[test]
fn field_added_optional() {
    let bytes = shale::to_bytes(&v1::Item { x: 1, y: 2 }).unwrap();
    let item: v2::Item = shale::from_bytes(&bytes).unwrap();
    assert_eq!(item, v2::Item { x: 1, y: 2, z: 0 });
}

#[test]
fn field_added_required() {
    let bytes = shale::to_bytes(&v1::Item { x: 1, y: 2 }).unwrap();
    let e = shale::from_bytes::<v2_required::Item>(&bytes).unwrap_err();
    match e.kind() {
        ErrorKind::MissingRequiredField { field, class } => {
            assert_eq!(field, "z");
            assert_eq!(class, "Item");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn field_removed() {
    let bytes = shale::to_bytes(&v2::Item { x: 1, y: 2, z: 3 }).unwrap();
    let item: v1::Item = ignoring().from_bytes(&bytes).unwrap();
    assert_eq!(item, v1::Item { x: 1, y: 2 });

    let e = shale::from_bytes::<v1::Item>(&bytes).unwrap_err();
    assert!(matches!(e.kind(), ErrorKind::UnknownFieldRejected { field, .. } if field == "z"));
}

#[test]
fn added_flag_keeps_default() {
    let doc = v1::Doc {
        name: "abc".into(),
        count: 3,
        tags: vec!["a".into(), "b".into()],
    };
    let bytes = shale::to_bytes(&doc).unwrap();
    let decoded: v2::Doc = shale::from_bytes(&bytes).unwrap();
    assert_eq!(
        decoded,
        v2::Doc {
            name: "abc".into(),
            count: 3,
            tags: vec!["a".into(), "b".into()],
            flag: false,
        }
    );
}

#[test]
fn removed_field_skipped_before_next_value() {
    let ser = Serializer::default();
    let mut out = Vec::new();
    let abc = v1::Abc {
        a: 1,
        b: vec!["two".into(), String::new()],
        c: 3,
    };
    ser.to_writer(&abc, &mut out).unwrap();
    ser.to_writer(&abc, &mut out).unwrap();
    ser.to_writer(&42i64, &mut out).unwrap();

    let de = ignoring();
    let mut input = out.as_slice();
    for _ in 0..2 {
        let ac: v2::Abc = de.from_reader(&mut input).unwrap();
        assert_eq!(ac, v2::Abc { a: 1, c: 3 });
    }
    assert_eq!(de.from_reader::<i64, _>(&mut input).unwrap(), 42);
    assert!(input.is_empty());
}

#[test]
fn interleaved_optional_fields() {
    let bytes = shale::to_bytes(&v1::Sparse { b: 2, d: 4 }).unwrap();
    let sparse: v2::Sparse = shale::from_bytes(&bytes).unwrap();
    assert_eq!(
        sparse,
        v2::Sparse {
            b: 2,
            d: 4,
            ..Default::default()
        }
    );

    let full = v2::Sparse {
        a: Some("a".into()),
        b: 2,
        c: vec![3],
        d: 4,
        e: true,
    };
    let bytes = shale::to_bytes(&full).unwrap();
    let sparse: v1::Sparse = ignoring().from_bytes(&bytes).unwrap();
    assert_eq!(sparse, v1::Sparse { b: 2, d: 4 });
}

#[test]
fn removed_record_field() {
    let holder = v1::Holder {
        extra: v1::Node { value: 5 },
        keep: 9,
    };
    let bytes = shale::to_bytes(&holder).unwrap();

    let e = ignoring().from_bytes::<v2::Holder>(&bytes).unwrap_err();
    assert!(matches!(e.kind(), ErrorKind::UnknownClass(name) if name == "Node"));

    let de = ignoring().with::<v1::Node>();
    assert_eq!(
        de.from_bytes::<v2::Holder>(&bytes).unwrap(),
        v2::Holder { keep: 9 }
    );
}

#[test]
fn static_check_agrees() {
    assert!(shale::is_backwards_compatible(
        v1::Item::meta(),
        v2::Item::meta(),
        false
    ));
    assert!(!shale::is_backwards_compatible(
        v1::Item::meta(),
        v2_required::Item::meta(),
        true
    ));
    assert!(!shale::is_backwards_compatible(
        v2::Item::meta(),
        v1::Item::meta(),
        false
    ));
    assert!(shale::is_backwards_compatible(
        v2::Item::meta(),
        v1::Item::meta(),
        true
    ));
}

use sgres_write::SgWrite;

#[test]
fn struct_fields_in_order() {
    #[derive(Debug, SgWrite)]
    struct TestStruct {
        x: u8,
        y: i32,
        z: f32,
    }

    let bytes = TestStruct { x: 1, y: -2, z: 1.0 }.to_bytes().unwrap();
    assert_eq!(
        vec![1u8, 0xfe, 0xff, 0xff, 0xff, 0x00, 0x00, 0x80, 0x3f],
        bytes
    );
}

#[test]
fn nested_struct() {
    #[derive(Debug, SgWrite)]
    struct Inner(u16);

    #[derive(Debug, SgWrite)]
    struct Outer {
        a: Inner,
        b: Option<Inner>,
        c: Vec<Inner>,
    }

    let value = Outer {
        a: Inner(1),
        b: None,
        c: vec![Inner(2), Inner(3)],
    };
    assert_eq!(vec![1u8, 0, 2, 0, 3, 0], value.to_bytes().unwrap());
}

#[test]
fn enum_writes_variant_fields_only() {
    #[derive(Debug, SgWrite)]
    enum TestEnum {
        A(u8),
        B { x: u16, y: u8 },
        C,
    }

    assert_eq!(vec![7u8], TestEnum::A(7).to_bytes().unwrap());
    assert_eq!(
        vec![1u8, 0, 2],
        TestEnum::B { x: 1, y: 2 }.to_bytes().unwrap()
    );
    assert!(TestEnum::C.to_bytes().unwrap().is_empty());
    assert_eq!(3, TestEnum::B { x: 1, y: 2 }.size_in_bytes());
}

#[test]
fn write_errors_propagate() {
    struct Failing;

    impl SgWrite for Failing {
        fn sg_write<W: std::io::Write>(&self, _writer: &mut W) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid"))
        }

        fn size_in_bytes(&self) -> u64 {
            0
        }
    }

    #[derive(SgWrite)]
    struct TestStruct {
        x: u8,
        y: Failing,
    }

    let mut bytes = Vec::new();
    let result = TestStruct { x: 1, y: Failing }.sg_write(&mut bytes);
    assert!(result.is_err());
    assert_eq!(vec![1u8], bytes);
}

use sgres_write::SgWrite;

#[test]
fn struct_size() {
    #[derive(Debug, Default, SgWrite)]
    struct TestStruct {
        x: u8,
        y: u16,
    }

    assert_eq!(3, TestStruct::default().size_in_bytes());
}

#[test]
fn tuple_struct_size() {
    #[derive(Debug, Default, SgWrite)]
    struct TestStruct(u32, [u8; 5]);

    assert_eq!(9, TestStruct::default().size_in_bytes());
}

#[test]
fn vec_of_variable_size() {
    #[derive(Debug, SgWrite)]
    struct Text(Vec<u8>);

    let values = vec![Text(vec![1, 2, 3]), Text(Vec::new()), Text(vec![4])];
    assert_eq!(4, values.size_in_bytes());
}

#[test]
fn option_size() {
    assert_eq!(4, Some(1u32).size_in_bytes());
    assert_eq!(0, None::<u32>.size_in_bytes());
}

#[test]
fn array_size() {
    #[derive(Debug, Default, SgWrite, Clone, Copy)]
    struct TestStruct {
        x: u8,
        y: u16,
    }

    assert_eq!(3 * 7, [TestStruct::default(); 7].size_in_bytes());
}

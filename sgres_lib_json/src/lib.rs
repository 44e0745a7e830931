#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sgres_lib::nodes::{BoneIndex, DataListEntry, DataListValue, NodeReference, TransformNode};
    use sgres_lib::{
        GeometryData, ResourceFile, SgArray, SgString, SgWrite, Tuple4, Vector3, Vector4,
    };

    #[test]
    fn serialize_deserialize_sg_array_empty() {
        let text = serde_json::to_string(&SgArray::<u8>::new()).unwrap();
        assert_eq!("[]", text);

        let v: SgArray<u8> = serde_json::from_str(&text).unwrap();
        assert_eq!(SgArray::<u8>::new(), v);
    }

    #[test]
    fn serialize_deserialize_sg_array() {
        let text = serde_json::to_string(&SgArray::from(vec![1u8, 2, 3])).unwrap();
        assert_eq!("[1,2,3]", text);

        let v: SgArray<u8> = serde_json::from_str(&text).unwrap();
        assert_eq!(SgArray::from(vec![1u8, 2, 3]), v);
    }

    #[test]
    fn serialize_deserialize_sg_string() {
        let text = serde_json::to_string(&SgString::from("bone")).unwrap();
        assert_eq!("\"bone\"", text);

        let v: SgString = serde_json::from_str(&text).unwrap();
        assert_eq!(Some("bone"), v.to_str());
    }

    #[test]
    fn serialize_deserialize_sg_string_invalid_utf8() {
        let value = SgString::new(vec![0xff, 0x41]);
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!("[255,65]", text);

        let v: SgString = serde_json::from_str(&text).unwrap();
        assert_eq!(value, v);
    }

    #[test]
    fn serialize_deserialize_tuple4() {
        let bones = Tuple4::from_slice(&[3u8, 7]).unwrap();
        let text = serde_json::to_string(&bones).unwrap();
        assert_eq!("[3,7]", text);

        let v: Tuple4<u8> = serde_json::from_str(&text).unwrap();
        assert_eq!(bones, v);
    }

    #[test]
    fn deserialize_tuple4_too_long() {
        let result = serde_json::from_str::<Tuple4<u8>>("[1,2,3,4,5]");
        assert!(result.is_err());
    }

    #[test]
    fn serialize_deserialize_bone_index() {
        assert_eq!("null", serde_json::to_string(&BoneIndex(None)).unwrap());
        assert_eq!("4", serde_json::to_string(&BoneIndex(Some(4))).unwrap());

        let v: BoneIndex = serde_json::from_str("null").unwrap();
        assert_eq!(BoneIndex(None), v);
    }

    #[test]
    fn serialize_deserialize_node_reference() {
        let text = serde_json::to_string(&NodeReference::new(2)).unwrap();
        assert_eq!("{\"enabled\":1,\"dependent\":0,\"index\":2}", text);
    }

    #[test]
    fn serialize_deserialize_data_list_entry() {
        let entry = DataListEntry::new(
            "props".into(),
            DataListValue::List(vec![DataListEntry::new("a".into(), DataListValue::Int(1))]),
        );
        let text = serde_json::to_string(&entry).unwrap();
        let v: DataListEntry = serde_json::from_str(&text).unwrap();
        assert_eq!(entry, v);
    }

    #[test]
    fn resource_file_json_round_trip() {
        let mut file = ResourceFile::from_geometry(
            "body".into(),
            GeometryData::from_mesh(
                "body".into(),
                vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                vec![[0.0, 0.0, 1.0]; 3],
                vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
                vec![[0, 1, 2]],
            ),
        );
        file.nodes.push(sgres_lib::Node::Transform(TransformNode::new(
            "root".into(),
            Vector3::new(1.0, 2.0, 3.0),
            Vector4::identity_rotation(),
            Some(0),
        )));

        let text = serde_json::to_string_pretty(&file).unwrap();
        let v: ResourceFile = serde_json::from_str(&text).unwrap();
        assert_eq!(file, v);
        assert_eq!(file.to_bytes().unwrap(), v.to_bytes().unwrap());
    }
}

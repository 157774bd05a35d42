fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use spfe_protocol::{
        AggregateManifest, ErrorResponse, MergeResponse, PartialRecord, StoreChunkRequest,
        StoreChunkResponse, partial_key,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent comparison).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    #[test]
    fn fixture_partial_record() {
        let record: PartialRecord = roundtrip_test("partial_record.json");
        assert_eq!(record.chunk_index, 0);
        assert_eq!(record.length, 5);
    }

    #[test]
    fn fixture_legacy_partial_uses_len_and_ts() {
        let fixture = load_fixture("legacy_partial.json");
        let record: PartialRecord = serde_json::from_value(fixture).unwrap();
        assert_eq!(record.file_id, "holiday video.mp4");
        assert_eq!(record.chunk_index, 1);
        assert_eq!(record.total_chunks, 3);
        assert_eq!(record.length, 5);
        assert_eq!(record.stored_at, 1_718_000_000_123);

        // Written back in the current names.
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["length"], 5);
        assert_eq!(json["storedAt"], 1_718_000_000_123i64);
        assert!(json.get("len").is_none());
        assert!(json.get("ts").is_none());
    }

    #[test]
    fn fixture_store_chunk_request() {
        let req: StoreChunkRequest = roundtrip_test("store_chunk_request.json");
        assert_eq!(req.decode_chunk().unwrap().unwrap(), b"!");
    }

    #[test]
    fn fixture_legacy_store_chunk_request() {
        let fixture = load_fixture("legacy_store_chunk_request.json");
        let req: StoreChunkRequest = serde_json::from_value(fixture).unwrap();
        assert_eq!(req.chunk_index, Some(0));
        assert_eq!(req.total_chunks, Some(3));
        assert_eq!(req.decode_chunk().unwrap().unwrap(), b"hello");
    }

    #[test]
    fn fixture_store_chunk_response() {
        let resp: StoreChunkResponse = roundtrip_test("store_chunk_response.json");
        assert!(resp.ok);
        assert_eq!(resp.partial.chunk_index, 2);
    }

    #[test]
    fn fixture_merge_response() {
        let resp: MergeResponse = roundtrip_test("merge_response.json");
        let aggregate: AggregateManifest = resp.aggregate;
        assert_eq!(aggregate.total_chunks_found, 3);
        assert!(aggregate.is_complete());

        let hashes: Vec<&str> = aggregate.partials.iter().map(|p| p.hash.as_str()).collect();
        assert_eq!(hashes, aggregate.hashes.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn fixture_error_response() {
        let resp: ErrorResponse = roundtrip_test("error_response.json");
        assert_eq!(resp, ErrorResponse::new("no chunk"));
    }

    #[test]
    fn keys_match_encode_uri_component() {
        assert_eq!(
            partial_key("holiday video.mp4", 1),
            "partials/holiday%20video.mp4/chunk_1.json"
        );
        assert_eq!(
            partial_key("dir/file?.bin", 0),
            "partials/dir%2Ffile%3F.bin/chunk_0.json"
        );
        assert_eq!(
            partial_key("caf\u{e9}.txt", 2),
            "partials/caf%C3%A9.txt/chunk_2.json"
        );
    }
}

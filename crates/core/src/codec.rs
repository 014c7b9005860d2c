use chronostore_datastore::{DatastoreError, Payload, Record, Result as DsResult};
use chronostore_primitives::TemporalId;
use serde::{Deserialize, Serialize};

/// On-wire document shape: reserved metadata fields plus a nested `data` payload. The
/// payload is kept nested rather than spliced onto the top level so an application
/// payload field can never collide with a reserved name like `_id`.
#[derive(Serialize, Deserialize)]
struct Document {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_key")]
    key: String,
    #[serde(rename = "_dataset")]
    dataset: String,
    #[serde(rename = "_t")]
    class_tag: String,
    #[serde(rename = "_deleted")]
    deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

pub fn encode_record(record: &Record) -> Vec<u8> {
    let doc = Document {
        id: record.id.to_hex(),
        key: record.key.clone(),
        dataset: record.dataset.to_hex(),
        class_tag: record.class_tag.clone(),
        deleted: record.payload.is_delete(),
        data: record.payload.as_data().cloned(),
    };
    serde_json::to_vec(&doc).expect("Document serializes infallibly")
}

pub fn decode_record(bytes: &[u8]) -> DsResult<Record> {
    let doc: Document = serde_json::from_slice(bytes)
        .map_err(|e| DatastoreError::Unavailable(format!("corrupt document: {e}")))?;
    let id = TemporalId::parse_hex(&doc.id).map_err(|e| DatastoreError::Unavailable(e.to_string()))?;
    let dataset = TemporalId::parse_hex(&doc.dataset).map_err(|e| DatastoreError::Unavailable(e.to_string()))?;
    let payload = if doc.deleted {
        Payload::Delete
    } else {
        Payload::Data(doc.data.unwrap_or(serde_json::Value::Null))
    };
    Ok(Record { id, dataset, key: doc.key, class_tag: doc.class_tag, payload })
}

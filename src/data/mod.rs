pub mod attendance;
pub mod class;
pub mod course;
pub mod grade;
pub mod room;
pub mod session;
pub mod slot;
pub mod user;

/// Identifiers are stored as hyphenated strings, so every filter on an
/// identifier goes through here.
pub mod filter {
    use bson::{doc, Document};
    use uuid::Uuid;

    pub fn strings(ids: &[Uuid]) -> Vec<String> {
        ids.iter().map(Uuid::to_string).collect()
    }

    #[inline]
    pub fn by_id(id: Uuid) -> Document {
        doc! { "_id": id.to_string() }
    }

    #[inline]
    pub fn by_ids(ids: &[Uuid]) -> Document {
        doc! { "_id": { "$in": strings(ids) } }
    }
}

/// Collects a cursor into a vector, dropping documents that don't deserialize.
pub(crate) async fn collect_cursor<T>(
    mut cursor: mongodb::Cursor<T>,
) -> Result<Vec<T>, mongodb::error::Error>
where
    T: serde::de::DeserializeOwned + Unpin + Send + Sync,
{
    use futures::StreamExt;

    let mut items = vec![];
    while let Some(result) = cursor.next().await {
        match result {
            Ok(it) => items.push(it),
            Err(e) => match e.kind.as_ref() {
                mongodb::error::ErrorKind::BsonDeserialization(_) => {
                    tracing::warn!("Unable to deserialize document: {}", e)
                }
                _ => return Err(e),
            },
        }
    }
    Ok(items)
}

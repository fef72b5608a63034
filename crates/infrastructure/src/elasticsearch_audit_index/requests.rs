use auditsearch_core::{AppError, AppResult};
use auditsearch_domain::{
    INDEX_DATE_FORMAT, IndexName, IndexSettings, MappedField, MappedFieldType, RetentionQuery,
};
use serde_json::{Map, Value, json};
use url::Url;

pub(super) fn normalize_host(raw: &str) -> AppResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("search host must not be empty".to_owned()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("http://{trimmed}")
    };

    let mut url = Url::parse(with_scheme.as_str()).map_err(|error| {
        AppError::Validation(format!("invalid search host '{trimmed}': {error}"))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "search host '{trimmed}' must use http or https"
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(path.as_str());
    }

    Ok(url)
}

/// Newest-first page of the entity's documents past the retained window.
///
/// `created_at` is stored at second precision, so audits written within the
/// same second have no defined order between them and retention may keep
/// either one.
pub(super) fn search_excess_body(query: &RetentionQuery) -> Value {
    json!({
        "_source": false,
        "from": query.skip(),
        "size": query.size(),
        "sort": [{ "created_at": { "order": "desc" } }],
        "query": {
            "bool": {
                "filter": [
                    { "term": { "auditable_id": query.auditable_id() } },
                    { "term": { "auditable_type": query.auditable_type() } }
                ]
            }
        }
    })
}

pub(super) fn search_hit_ids(response: &Value) -> Vec<String> {
    response
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit.get("_id").and_then(Value::as_str))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Newline-delimited bulk body with one delete action per document.
pub(super) fn bulk_delete_body(index: &IndexName, document_ids: &[String]) -> AppResult<String> {
    let mut body = String::new();
    for document_id in document_ids {
        let action = json!({ "delete": { "_index": index.as_str(), "_id": document_id } });
        let line = serde_json::to_string(&action).map_err(|error| {
            AppError::Internal(format!("failed to encode bulk delete action: {error}"))
        })?;
        body.push_str(line.as_str());
        body.push('\n');
    }

    Ok(body)
}

pub(super) fn bulk_failure_count(response: &Value) -> usize {
    if !response
        .get("errors")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        return 0;
    }

    response
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|item| {
                    item.as_object()
                        .and_then(|actions| actions.values().next())
                        .is_some_and(|result| result.get("error").is_some())
                })
                .count()
        })
        .unwrap_or_default()
}

pub(super) fn create_index_body(settings: IndexSettings) -> Value {
    json!({
        "settings": {
            "number_of_shards": settings.number_of_shards,
            "number_of_replicas": settings.number_of_replicas
        }
    })
}

/// Renders dot-separated field paths into nested `properties` objects.
pub(super) fn mapping_body(fields: &[MappedField]) -> Value {
    let mut properties = Map::new();

    for field in fields {
        let mut segments = field.path.split('.').peekable();
        let mut level = &mut properties;

        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                level.insert(segment.to_owned(), field_definition(field.field_type));
                break;
            }

            let Some(nested) = level
                .entry(segment.to_owned())
                .or_insert_with(|| json!({ "properties": {} }))
                .get_mut("properties")
                .and_then(Value::as_object_mut)
            else {
                break;
            };
            level = nested;
        }
    }

    json!({ "properties": properties })
}

fn field_definition(field_type: MappedFieldType) -> Value {
    match field_type {
        MappedFieldType::Keyword => json!({ "type": "keyword" }),
        MappedFieldType::Date => json!({ "type": "date", "format": INDEX_DATE_FORMAT }),
    }
}

pub(super) fn alias_actions_body(index: &IndexName, alias: &str) -> Value {
    json!({
        "actions": [
            { "add": { "index": index.as_str(), "alias": alias } }
        ]
    })
}

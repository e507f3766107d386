use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_PREFIX: &str = "/api/20130724/make";

const NEGATION: &str = "{!}";
const DEFAULT_LIMIT: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Make {
    #[serde(rename = "_id")]
    pub id: String,
    pub url: String,
    pub content_type: String,
    pub locale: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub published: bool,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remixed_from: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub likes: Vec<Maker>,
    pub reports: Vec<Maker>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Maker {
    pub maker: String,
}

/// Body of create and update. Unknown fields (e.g. `_id`, `likes`) are
/// ignored so a client can send back a record it fetched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeInput {
    pub url: Option<String>,
    pub content_type: Option<String>,
    pub locale: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub thumbnail: Option<String>,
    pub username: Option<String>,
    pub remixed_from: Option<String>,
    pub created_at: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub makes: Vec<Make>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagCount {
    pub term: String,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagSuggestions {
    pub tags: Vec<TagCount>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemixCount {
    pub count: usize,
}

pub type Db = Arc<RwLock<Vec<Make>>>;

/// JSON error body: `{"error": "..."}`.
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

fn not_found(id: &str) -> ApiError {
    ApiError(StatusCode::NOT_FOUND, format!("make {id} not found"))
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route(&format!("{API_PREFIX}/"), post(create_make))
        .route(&format!("{API_PREFIX}/search"), get(search))
        .route(&format!("{API_PREFIX}/protectedSearch"), get(search))
        .route(&format!("{API_PREFIX}/tags"), get(autocomplete_tags))
        .route(&format!("{API_PREFIX}/remixCount"), get(remix_count))
        .route(&format!("{API_PREFIX}/like/{{id}}"), put(like))
        .route(&format!("{API_PREFIX}/unlike/{{id}}"), put(unlike))
        .route(&format!("{API_PREFIX}/report/{{id}}"), put(report))
        .route(&format!("{API_PREFIX}/cancelReport/{{id}}"), put(cancel_report))
        .route(
            &format!("{API_PREFIX}/{{id}}"),
            put(update_make).delete(delete_make),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

async fn create_make(
    State(db): State<Db>,
    Json(input): Json<MakeInput>,
) -> Result<Json<Make>, ApiError> {
    let url = input
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError(StatusCode::BAD_REQUEST, "url is required".to_string()))?;
    let now = now_millis();
    let make = Make {
        id: Uuid::new_v4().to_string(),
        url,
        content_type: input.content_type.unwrap_or_default(),
        locale: input.locale.unwrap_or_else(|| "en_US".to_string()),
        title: input.title.unwrap_or_default(),
        description: input.description.unwrap_or_default(),
        author: input.author,
        published: input.published.unwrap_or(true),
        tags: input.tags.unwrap_or_default(),
        thumbnail: input.thumbnail,
        username: input.username,
        remixed_from: input.remixed_from,
        created_at: input.created_at.unwrap_or(now),
        updated_at: now,
        likes: Vec::new(),
        reports: Vec::new(),
    };
    tracing::info!(id = %make.id, "make created");
    db.write().await.push(make.clone());
    Ok(Json(make))
}

async fn update_make(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<MakeInput>,
) -> Result<Json<Make>, ApiError> {
    let mut makes = db.write().await;
    let make = makes
        .iter_mut()
        .find(|m| m.id == id)
        .ok_or_else(|| not_found(&id))?;
    if let Some(url) = input.url {
        make.url = url;
    }
    if let Some(content_type) = input.content_type {
        make.content_type = content_type;
    }
    if let Some(locale) = input.locale {
        make.locale = locale;
    }
    if let Some(title) = input.title {
        make.title = title;
    }
    if let Some(description) = input.description {
        make.description = description;
    }
    if input.author.is_some() {
        make.author = input.author;
    }
    if let Some(published) = input.published {
        make.published = published;
    }
    if let Some(tags) = input.tags {
        make.tags = tags;
    }
    if input.thumbnail.is_some() {
        make.thumbnail = input.thumbnail;
    }
    make.updated_at = now_millis();
    Ok(Json(make.clone()))
}

async fn delete_make(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Make>, ApiError> {
    let mut makes = db.write().await;
    let pos = makes
        .iter()
        .position(|m| m.id == id)
        .ok_or_else(|| not_found(&id))?;
    tracing::info!(%id, "make deleted");
    Ok(Json(makes.remove(pos)))
}

// ---------------------------------------------------------------------------
// Likes and reports
// ---------------------------------------------------------------------------

async fn with_make(
    db: &Db,
    id: &str,
    change: impl FnOnce(&mut Make),
) -> Result<Json<Make>, ApiError> {
    let mut makes = db.write().await;
    let make = makes
        .iter_mut()
        .find(|m| m.id == id)
        .ok_or_else(|| not_found(id))?;
    change(make);
    Ok(Json(make.clone()))
}

fn add_maker(list: &mut Vec<Maker>, maker: Maker) {
    if !list.contains(&maker) {
        list.push(maker);
    }
}

async fn like(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(maker): Json<Maker>,
) -> Result<Json<Make>, ApiError> {
    with_make(&db, &id, |m| add_maker(&mut m.likes, maker)).await
}

async fn unlike(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(maker): Json<Maker>,
) -> Result<Json<Make>, ApiError> {
    with_make(&db, &id, |m| m.likes.retain(|l| l != &maker)).await
}

async fn report(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(maker): Json<Maker>,
) -> Result<Json<Make>, ApiError> {
    with_make(&db, &id, |m| add_maker(&mut m.reports, maker)).await
}

async fn cancel_report(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(maker): Json<Maker>,
) -> Result<Json<Make>, ApiError> {
    with_make(&db, &id, |m| m.reports.retain(|r| r != &maker)).await
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// One decoded search predicate.
#[derive(Debug, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub value: String,
    pub negated: bool,
}

impl Predicate {
    pub fn parse(field: &str, raw: &str) -> Self {
        let (negated, value) = match raw.strip_prefix(NEGATION) {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        Self {
            field: field.to_string(),
            value: value.to_string(),
            negated,
        }
    }

    /// `None` for fields the mock does not filter on.
    pub fn matches(&self, make: &Make) -> Option<bool> {
        let hit = match self.field.as_str() {
            "author" => make.author.as_deref() == Some(self.value.as_str()),
            "user" => make.username.as_deref() == Some(self.value.as_str()),
            "url" => make.url == self.value,
            "contentType" => make.content_type == self.value,
            "remixedFrom" => make.remixed_from.as_deref() == Some(self.value.as_str()),
            "tagPrefix" => make.tags.iter().any(|t| t.starts_with(&self.value)),
            "title" => contains_ignore_case(&make.title, &self.value),
            "description" => contains_ignore_case(&make.description, &self.value),
            "tags" => match_terms(&self.value, |term| make.tags.iter().any(|t| t == term)),
            "id" => match split_execution(&self.value) {
                Some(_) => match_terms(&self.value, |term| make.id == term),
                None => make.id == self.value,
            },
            _ => return None,
        };
        Some(hit != self.negated)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn split_execution(value: &str) -> Option<(&str, &str)> {
    value
        .split_once(',')
        .filter(|(exec, _)| *exec == "and" || *exec == "or")
}

/// Evaluate `<execution>,<term>,...`; a value without execution is one term.
fn match_terms(value: &str, has: impl Fn(&str) -> bool) -> bool {
    let (execution, terms) = split_execution(value).unwrap_or(("and", value));
    let mut terms = terms.split(',').map(str::trim).filter(|t| !t.is_empty());
    if execution == "or" {
        terms.any(has)
    } else {
        terms.all(has)
    }
}

fn sort_makes(makes: &mut [Make], spec: Option<&String>) {
    let (field, direction) = spec
        .and_then(|s| s.split_once(','))
        .unwrap_or(("createdAt", "desc"));
    makes.sort_by(|a, b| {
        let ord = match field {
            "title" => a.title.cmp(&b.title),
            "updatedAt" => a.updated_at.cmp(&b.updated_at),
            "likes" => a.likes.len().cmp(&b.likes.len()),
            _ => a.created_at.cmp(&b.created_at),
        };
        if direction == "asc" {
            ord
        } else {
            ord.reverse()
        }
    });
}

async fn search(
    State(db): State<Db>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<SearchResponse> {
    let any = params.contains_key("or");
    let predicates: Vec<Predicate> = params
        .iter()
        .map(|(field, value)| Predicate::parse(field, value))
        .collect();

    let mut hits: Vec<Make> = db
        .read()
        .await
        .iter()
        .filter(|make| {
            let mut outcomes = predicates.iter().filter_map(|p| p.matches(make)).peekable();
            if outcomes.peek().is_none() {
                return true;
            }
            if any {
                outcomes.any(|hit| hit)
            } else {
                outcomes.all(|hit| hit)
            }
        })
        .cloned()
        .collect();
    sort_makes(&mut hits, params.get("sortByField"));

    let total = hits.len();
    let limit = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(DEFAULT_LIMIT);
    let page = params
        .get("page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let makes = hits.into_iter().skip((page - 1) * limit).take(limit).collect();
    Json(SearchResponse { makes, total })
}

#[derive(Debug, Deserialize)]
pub struct TagQuery {
    #[serde(default)]
    pub t: String,
    #[serde(default)]
    pub s: Option<usize>,
}

async fn autocomplete_tags(
    State(db): State<Db>,
    Query(query): Query<TagQuery>,
) -> Json<TagSuggestions> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for make in db.read().await.iter() {
        for tag in make.tags.iter().filter(|t| t.starts_with(&query.t)) {
            *counts.entry(tag.clone()).or_default() += 1;
        }
    }
    let mut tags: Vec<TagCount> = counts
        .into_iter()
        .map(|(term, count)| TagCount { term, count })
        .collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
    let total = tags.len();
    tags.truncate(query.s.unwrap_or(DEFAULT_LIMIT));
    Json(TagSuggestions { tags, total })
}

#[derive(Debug, Deserialize)]
pub struct RemixQuery {
    pub id: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

async fn remix_count(
    State(db): State<Db>,
    Query(query): Query<RemixQuery>,
) -> Json<RemixCount> {
    let from = query.from.parse::<i64>().unwrap_or(i64::MIN);
    let to = query.to.parse::<i64>().unwrap_or(i64::MAX);
    let count = db
        .read()
        .await
        .iter()
        .filter(|m| m.remixed_from.as_deref() == Some(query.id.as_str()))
        .filter(|m| m.created_at >= from && m.created_at <= to)
        .count();
    Json(RemixCount { count })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(id: &str, tags: &[&str]) -> Make {
        Make {
            id: id.to_string(),
            url: format!("http://example.org/{id}"),
            content_type: "application/x-thimble".to_string(),
            locale: "en_US".to_string(),
            title: "Kitten Gallery".to_string(),
            description: String::new(),
            author: Some("jane".to_string()),
            published: true,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            thumbnail: None,
            username: Some("jane".to_string()),
            remixed_from: None,
            created_at: 0,
            updated_at: 0,
            likes: Vec::new(),
            reports: Vec::new(),
        }
    }

    #[test]
    fn make_serializes_with_wire_names() {
        let json = serde_json::to_value(make("m1", &["a"])).unwrap();
        assert_eq!(json["_id"], "m1");
        assert_eq!(json["contentType"], "application/x-thimble");
        assert!(json.get("remixedFrom").is_none());
    }

    #[test]
    fn make_input_ignores_unknown_fields() {
        let input: MakeInput =
            serde_json::from_str(r#"{"_id":"x","likes":[],"title":"T"}"#).unwrap();
        assert_eq!(input.title.as_deref(), Some("T"));
        assert!(input.url.is_none());
    }

    #[test]
    fn predicate_parses_negation() {
        let p = Predicate::parse("author", "{!}bob");
        assert!(p.negated);
        assert_eq!(p.value, "bob");
        assert_eq!(p.matches(&make("m1", &[])), Some(true));
    }

    #[test]
    fn tag_predicates_honour_execution() {
        let m = make("m1", &["a", "b"]);
        assert_eq!(Predicate::parse("tags", "and,a,b").matches(&m), Some(true));
        assert_eq!(Predicate::parse("tags", "and,a,c").matches(&m), Some(false));
        assert_eq!(Predicate::parse("tags", "or,a,c").matches(&m), Some(true));
        assert_eq!(Predicate::parse("tags", "{!}or,c").matches(&m), Some(true));
    }

    #[test]
    fn id_predicate_plain_or_list() {
        let m = make("m1", &[]);
        assert_eq!(Predicate::parse("id", "m1").matches(&m), Some(true));
        assert_eq!(Predicate::parse("id", "or,m0,m1").matches(&m), Some(true));
        assert_eq!(Predicate::parse("id", "or,m0").matches(&m), Some(false));
    }

    #[test]
    fn paging_fields_are_not_filters() {
        let m = make("m1", &[]);
        assert_eq!(Predicate::parse("limit", "5").matches(&m), None);
        assert_eq!(Predicate::parse("or", "1").matches(&m), None);
    }

    #[test]
    fn title_matches_case_insensitively() {
        let m = make("m1", &[]);
        assert_eq!(Predicate::parse("title", "kitten").matches(&m), Some(true));
    }

    #[test]
    fn sort_by_title_ascending() {
        let mut a = make("a", &[]);
        a.title = "B".to_string();
        let mut b = make("b", &[]);
        b.title = "A".to_string();
        let mut makes = vec![a, b];
        sort_makes(&mut makes, Some(&"title,asc".to_string()));
        assert_eq!(makes[0].id, "b");
    }
}

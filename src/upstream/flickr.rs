//! Flickr REST client.
//!
//! Uses the JSON flavour of the REST endpoint. Requests are signed with the
//! legacy `api_sig` scheme whenever a shared secret is configured.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use super::{PhotoSource, SearchQuery};
use crate::error::{GalleryError, Result};
use crate::models::{Photo, PhotoDetail, PhotoSize};

const API_ENDPOINT: &str = "https://api.flickr.com/services/rest/";
const PER_PAGE: u32 = 500;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// == Flickr Client ==
#[derive(Debug, Clone)]
pub struct FlickrClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    secret: String,
    auth_token: String,
    user_id: String,
}

impl FlickrClient {
    pub fn new(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        auth_token: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("toomore_photos/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: API_ENDPOINT.to_string(),
            api_key: api_key.into(),
            secret: secret.into(),
            auth_token: auth_token.into(),
            user_id: user_id.into(),
        })
    }

    /// Points the client at another REST endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    // == Request Signing ==
    /// Full parameter set for one call, sorted by name, signature last.
    fn params(&self, method: &str, args: &[(&str, String)]) -> Vec<(String, String)> {
        let mut params: BTreeMap<String, String> = args
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        params.insert("method".to_string(), method.to_string());
        params.insert("api_key".to_string(), self.api_key.clone());
        params.insert("format".to_string(), "json".to_string());
        params.insert("nojsoncallback".to_string(), "1".to_string());
        if !self.auth_token.is_empty() {
            params.insert("auth_token".to_string(), self.auth_token.clone());
        }

        let mut params: Vec<(String, String)> = params.into_iter().collect();
        if !self.secret.is_empty() {
            let signature = sign(&self.secret, &params);
            params.push(("api_sig".to_string(), signature));
        }
        params
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, args: &[(&str, String)]) -> Result<T> {
        debug!(method, "flickr request");
        let body: Value = self
            .http
            .get(&self.endpoint)
            .query(&self.params(method, args))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        decode(method, body)
    }
}

#[async_trait]
impl PhotoSource for FlickrClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Photo>> {
        let mut args = vec![
            ("user_id", self.user_id.clone()),
            ("sort", "date-posted-desc".to_string()),
            ("per_page", PER_PAGE.to_string()),
        ];
        if let Some(tags) = &query.tags {
            args.push(("tags", tags.clone()));
            args.push(("tag_mode", query.tag_mode.as_str().to_string()));
        }

        let mut photos = Vec::new();
        let mut page = 1u32;
        loop {
            let mut page_args = args.clone();
            page_args.push(("page", page.to_string()));

            let body: SearchBody = self.call("flickr.photos.search", &page_args).await?;
            let last_page = body.photos.pages;
            photos.extend(body.photos.photo.into_iter().map(Photo::from));

            if page >= last_page {
                break;
            }
            page += 1;
        }
        Ok(photos)
    }

    async fn photo_info(&self, photo_id: &str) -> Result<PhotoDetail> {
        let body: InfoBody = self
            .call("flickr.photos.getInfo", &[("photo_id", photo_id.to_string())])
            .await?;
        Ok(body.photo.into())
    }

    async fn photo_sizes(&self, photo_id: &str) -> Result<Vec<PhotoSize>> {
        let body: SizesBody = self
            .call("flickr.photos.getSizes", &[("photo_id", photo_id.to_string())])
            .await?;
        Ok(body.sizes.size.into_iter().map(PhotoSize::from).collect())
    }
}

/// `md5(secret + name1 + value1 + name2 + value2 ...)` over sorted parameters.
fn sign(secret: &str, sorted_params: &[(String, String)]) -> String {
    let mut payload = secret.to_string();
    for (name, value) in sorted_params {
        payload.push_str(name);
        payload.push_str(value);
    }
    format!("{:x}", md5::compute(payload.as_bytes()))
}

/// Checks the `stat` field every Flickr response carries, then decodes.
fn decode<T: DeserializeOwned>(method: &str, body: Value) -> Result<T> {
    match body.get("stat").and_then(Value::as_str) {
        Some("ok") => serde_json::from_value(body)
            .map_err(|e| GalleryError::Upstream(format!("{}: malformed response: {}", method, e))),
        stat => {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            Err(GalleryError::Unavailable(format!(
                "{} returned stat={} ({})",
                method,
                stat.unwrap_or("missing"),
                message
            )))
        }
    }
}

// == Wire Types ==
#[derive(Debug, Deserialize)]
struct SearchBody {
    photos: WirePage,
}

#[derive(Debug, Deserialize)]
struct WirePage {
    #[serde(default, deserialize_with = "lenient_u32")]
    pages: u32,
    #[serde(default)]
    photo: Vec<WirePhoto>,
}

#[derive(Debug, Deserialize)]
struct WirePhoto {
    id: String,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    secret: String,
    #[serde(default, deserialize_with = "lenient_string")]
    server: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    farm: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    ispublic: u32,
}

impl From<WirePhoto> for Photo {
    fn from(wire: WirePhoto) -> Self {
        Photo {
            id: wire.id,
            owner: wire.owner,
            title: wire.title,
            secret: wire.secret,
            server: wire.server,
            farm: wire.farm,
            is_public: wire.ispublic != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InfoBody {
    photo: WireInfo,
}

#[derive(Debug, Deserialize)]
struct WireInfo {
    id: String,
    #[serde(default)]
    secret: String,
    #[serde(default, deserialize_with = "lenient_string")]
    server: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    farm: u32,
    #[serde(default, deserialize_with = "lenient_string")]
    license: String,
    #[serde(default)]
    owner: WireOwner,
    #[serde(default)]
    title: WireContent,
    #[serde(default)]
    description: WireContent,
    #[serde(default)]
    dates: WireDates,
    #[serde(default)]
    tags: WireTags,
}

#[derive(Debug, Default, Deserialize)]
struct WireOwner {
    #[serde(default)]
    nsid: String,
    #[serde(default)]
    username: String,
}

#[derive(Debug, Default, Deserialize)]
struct WireContent {
    #[serde(rename = "_content", default)]
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct WireDates {
    #[serde(default, deserialize_with = "lenient_i64")]
    posted: i64,
}

#[derive(Debug, Default, Deserialize)]
struct WireTags {
    #[serde(default)]
    tag: Vec<WireTag>,
}

#[derive(Debug, Deserialize)]
struct WireTag {
    #[serde(default)]
    raw: String,
}

impl From<WireInfo> for PhotoDetail {
    fn from(wire: WireInfo) -> Self {
        PhotoDetail {
            id: wire.id,
            owner: wire.owner.nsid,
            owner_name: wire.owner.username,
            title: wire.title.content,
            description: wire.description.content,
            tags: wire
                .tags
                .tag
                .into_iter()
                .map(|tag| tag.raw)
                .filter(|raw| !raw.is_empty())
                .collect(),
            posted: wire.dates.posted,
            secret: wire.secret,
            server: wire.server,
            farm: wire.farm,
            license: wire.license,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SizesBody {
    sizes: WireSizes,
}

#[derive(Debug, Deserialize)]
struct WireSizes {
    #[serde(default)]
    size: Vec<WireSize>,
}

#[derive(Debug, Deserialize)]
struct WireSize {
    #[serde(default)]
    label: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    width: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    height: i64,
}

impl From<WireSize> for PhotoSize {
    fn from(wire: WireSize) -> Self {
        PhotoSize {
            label: wire.label,
            width: wire.width,
            height: wire.height,
        }
    }
}

// == Lenient Scalars ==
// Flickr sends some numbers as strings and some strings as numbers.

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    lenient_i64(deserializer).map(|n| u32::try_from(n).unwrap_or(0))
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::TagMode;
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn client() -> FlickrClient {
        FlickrClient::new("key", "", "", "92438116@N00").unwrap()
    }

    #[test]
    fn test_signature_matches_legacy_scheme() {
        let params = vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ];
        let expected = format!("{:x}", md5::compute("secreta1b2".as_bytes()));
        assert_eq!(sign("secret", &params), expected);
    }

    #[test]
    fn test_params_signed_only_with_secret() {
        let unsigned = client().params("flickr.test.echo", &[]);
        assert!(unsigned.iter().all(|(k, _)| k != "api_sig"));

        let signed = FlickrClient::new("key", "secret", "token", "me")
            .unwrap()
            .params("flickr.test.echo", &[("photo_id", "1".to_string())]);
        assert_eq!(signed.last().map(|(k, _)| k.as_str()), Some("api_sig"));
        assert!(signed.iter().any(|(k, v)| k == "auth_token" && v == "token"));
    }

    #[test]
    fn test_decode_failure_status_is_unavailable() {
        let body = json!({"stat": "fail", "code": 1, "message": "Photo not found"});
        let result: Result<InfoBody> = decode("flickr.photos.getInfo", body);
        match result {
            Err(GalleryError::Unavailable(msg)) => assert!(msg.contains("Photo not found")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_info_with_mixed_scalar_types() {
        let body = json!({
            "stat": "ok",
            "photo": {
                "id": "53000000001",
                "secret": "abc",
                "server": 65535,
                "farm": 66,
                "license": "4",
                "owner": {"nsid": "92438116@N00", "username": "toomore"},
                "title": {"_content": "Kyoto"},
                "description": {"_content": "line1\nline2"},
                "dates": {"posted": "1700000000"},
                "tags": {"tag": [{"raw": "japan"}, {"raw": ""}, {"raw": "kyoto"}]}
            }
        });
        let detail: PhotoDetail = decode::<InfoBody>("flickr.photos.getInfo", body)
            .unwrap()
            .photo
            .into();

        assert_eq!(detail.server, "65535");
        assert_eq!(detail.posted, 1_700_000_000);
        assert_eq!(detail.tags, vec!["japan", "kyoto"]);
        assert_eq!(detail.owner, "92438116@N00");
    }

    #[test]
    fn test_decode_sizes_with_string_dimensions() {
        let body = json!({
            "stat": "ok",
            "sizes": {"size": [
                {"label": "Large 1024", "width": "1024", "height": "683"},
                {"label": "Original", "width": 6000, "height": "bogus"}
            ]}
        });
        let sizes: Vec<PhotoSize> = decode::<SizesBody>("flickr.photos.getSizes", body)
            .unwrap()
            .sizes
            .size
            .into_iter()
            .map(PhotoSize::from)
            .collect();

        assert_eq!(sizes[0].width, 1024);
        assert_eq!(sizes[1].height, 0);
    }

    async fn fake_rest(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        let tagged = params.get("tags").cloned().unwrap_or_default();
        Json(json!({
            "stat": "ok",
            "photos": {
                "page": page,
                "pages": "3",
                "photo": [{
                    "id": format!("{}-{}", tagged, page),
                    "owner": "me",
                    "title": "t",
                    "secret": "s",
                    "server": "1",
                    "farm": 1,
                    "ispublic": if page == 2 { 0 } else { 1 }
                }]
            }
        }))
    }

    #[tokio::test]
    async fn test_search_walks_every_page() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().route("/rest", get(fake_rest)))
                .await
                .unwrap();
        });

        let flickr = client().with_endpoint(format!("http://{}/rest", addr));
        let photos = flickr
            .search(&SearchQuery::by_tag("japan", TagMode::All))
            .await
            .unwrap();

        let ids: Vec<&str> = photos.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["japan-1", "japan-2", "japan-3"]);
        assert!(!photos[1].is_public);
    }
}

//! Scripted stand-in for the Piazza server
#![allow(dead_code)]

use piazza_harvest::ScrapeError;
use piazza_harvest::networking::{HttpReply, Transport};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

pub const BASE: &str = "https://piazza.test";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub verb: &'static str,
    pub url: String,
    pub body: Option<Value>,
    pub form: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl Recorded {
    pub fn method(&self) -> Option<&str> {
        self.body.as_ref()?.get("method")?.as_str()
    }

    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

pub struct FakePiazza {
    pub csrf_page: String,
    pub login_status: u16,
    pub login_body: String,
    pub feed_ids: Vec<String>,
    pub feed_error: Option<String>,
    /// answer every feed request as if the offset were 0
    pub ignore_offset: bool,
    pub posts: HashMap<String, Value>,
    /// cids whose fetch fails at the transport level
    pub broken: HashSet<String>,
    pub requests: RefCell<Vec<Recorded>>,
    cookies: RefCell<HashMap<String, String>>,
}

/// A well-formed `content.get` result
pub fn post(nr: u64, subject: &str, instructor: &[&str], student: &[&str]) -> Value {
    let mut children: Vec<Value> = instructor
        .iter()
        .map(|c| json!({"type": "i_answer", "history": [{"content": c}]}))
        .collect();
    children.extend(
        student
            .iter()
            .map(|c| json!({"type": "s_answer", "history": [{"content": c}]})),
    );
    children.push(json!({"type": "followup", "subject": "thanks", "children": []}));
    json!({
        "id": format!("cid{nr}"),
        "nr": nr,
        "created": "2024-09-15T12:00:00Z",
        "folders": ["cs101", "midterm"],
        "history": [{"subject": subject, "content": format!("<p>question {nr}</p>")}],
        "children": children
    })
}

impl FakePiazza {
    /// A server listing `ids`, each backed by a post whose `nr` is the id
    pub fn with_posts(ids: &[u64]) -> Self {
        let mut fake = Self {
            csrf_page: "CSRF_TOKEN=abc123;".to_string(),
            login_status: 200,
            login_body: "<html>welcome</html>".to_string(),
            feed_ids: Vec::new(),
            feed_error: None,
            ignore_offset: false,
            posts: HashMap::new(),
            broken: HashSet::new(),
            requests: RefCell::new(Vec::new()),
            cookies: RefCell::new(HashMap::new()),
        };
        for &id in ids {
            fake.feed_ids.push(id.to_string());
            fake.posts.insert(
                id.to_string(),
                post(id, &format!("subject {id}"), &["see syllabus"], &[]),
            );
        }
        fake
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.requests.borrow().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Recorded> {
        self.recorded()
            .into_iter()
            .filter(|r| r.method() == Some(method))
            .collect()
    }

    fn record(&self, recorded: Recorded) {
        self.requests.borrow_mut().push(recorded);
    }

    fn feed_reply(&self, params: &Value) -> Value {
        if let Some(error) = &self.feed_error {
            return json!({"result": null, "error": error});
        }
        let offset = if self.ignore_offset {
            0
        } else {
            params["offset"].as_u64().unwrap_or(0) as usize
        };
        let limit = params["limit"].as_u64().unwrap_or(0) as usize;
        let page: Vec<Value> = self
            .feed_ids
            .iter()
            .skip(offset)
            .take(limit)
            .map(|id| json!({"id": id, "nr": id.parse::<u64>().ok()}))
            .collect();
        json!({"result": {"feed": page, "more": false}, "error": null})
    }

    fn content_reply(&self, params: &Value) -> Value {
        let cid = params["cid"].as_str().unwrap_or_default();
        match self.posts.get(cid) {
            Some(post) => json!({"result": post, "error": null}),
            None => json!({"result": null, "error": "The post you are looking for cannot be found"}),
        }
    }
}

impl Transport for FakePiazza {
    fn get(&self, url: &str) -> Result<HttpReply, ScrapeError> {
        self.record(Recorded {
            verb: "GET",
            url: url.to_string(),
            body: None,
            form: Vec::new(),
            headers: Vec::new(),
        });
        if url == format!("{BASE}/main/csrf_token") {
            Ok(HttpReply::ok(self.csrf_page.clone()))
        } else {
            Ok(HttpReply::new(404, "not found"))
        }
    }

    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpReply, ScrapeError> {
        self.record(Recorded {
            verb: "POST",
            url: url.to_string(),
            body: None,
            form: form
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            headers: Vec::new(),
        });
        if url != format!("{BASE}/class") {
            return Ok(HttpReply::new(404, "not found"));
        }
        if self.login_status == 200 {
            self.cookies
                .borrow_mut()
                .insert("session_id".to_string(), "sess-1".to_string());
        }
        Ok(HttpReply::new(self.login_status, self.login_body.clone()))
    }

    fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &[(&str, &str)],
    ) -> Result<HttpReply, ScrapeError> {
        self.record(Recorded {
            verb: "POST",
            url: url.to_string(),
            body: Some(body.clone()),
            form: Vec::new(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        let params = &body["params"];
        let reply = match body["method"].as_str() {
            Some("network.get_my_feed") => self.feed_reply(params),
            Some("content.get") => {
                let cid = params["cid"].as_str().unwrap_or_default();
                if self.broken.contains(cid) {
                    return Err(ScrapeError::GenericError("connection reset".to_string()));
                }
                self.content_reply(params)
            }
            _ => json!({"result": null, "error": "unknown method"}),
        };
        Ok(HttpReply::ok(reply.to_string()))
    }

    fn cookie(&self, url: &str, name: &str) -> Option<String> {
        if !url.starts_with(BASE) {
            return None;
        }
        self.cookies.borrow().get(name).cloned()
    }
}

//! Encyclopedia fact lookup against the Wikipedia REST API.
//!
//! One search request with `limit=1`; the top hit's excerpt is stripped of
//! search-match markup and truncated to the configured character cap. A
//! miss or an upstream failure both come back as friendly Swedish text,
//! never as a tool error: homework help should degrade, not crash.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use laxbot_core::{Tool, ToolError, ToolName};

pub struct SearchInformationTool {
    client: reqwest::Client,
    api_url: String,
    excerpt_limit: usize,
}

#[derive(Deserialize)]
struct SearchPage {
    title: String,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    pages: Vec<SearchPage>,
}

impl SearchInformationTool {
    pub fn new(client: reqwest::Client, api_url: String, excerpt_limit: usize) -> Self {
        Self {
            client,
            api_url,
            excerpt_limit,
        }
    }

    async fn search(&self, query: &str) -> Result<Option<SearchPage>, reqwest::Error> {
        let url = format!("{}/search/page", self.api_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?;

        let body: SearchResponse = response.json().await?;
        Ok(body.pages.into_iter().next())
    }

    fn render(&self, query: &str, subject: &str, page: SearchPage) -> String {
        let raw = page
            .excerpt
            .as_deref()
            .map(strip_markup)
            .filter(|text| !text.is_empty())
            .or(page.description)
            .unwrap_or_else(|| page.title.clone());

        let excerpt = truncate_chars(&raw, self.excerpt_limit);
        format!("Information om \"{query}\" ({subject}):\n\n{excerpt}\n\nKälla: Wikipedia")
    }
}

/// Remove the `<span class="searchmatch">` style tags the search excerpt
/// carries, keeping the text between them.
fn strip_markup(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Truncate on a character boundary, appending an ellipsis when cut.
fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{cut}...")
}

#[async_trait]
impl Tool for SearchInformationTool {
    fn name(&self) -> ToolName {
        ToolName::SearchInformation
    }

    fn description(&self) -> &str {
        "Sök efter faktainformation inom NO-ämnen (naturvetenskap), historia, geografi etc."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Fråga eller sökterm att hitta information om"
                },
                "subject": {
                    "type": "string",
                    "enum": [
                        "naturvetenskap", "biologi", "fysik", "kemi",
                        "historia", "geografi", "samhällskunskap"
                    ],
                    "description": "Ämnesområde för sökningen"
                }
            },
            "required": ["query", "subject"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;
        let subject = arguments["subject"].as_str().unwrap_or("allmänt");

        match self.search(query).await {
            Ok(Some(page)) => Ok(self.render(query, subject, page)),
            Ok(None) => Ok(format!(
                "Hittade ingen information om \"{query}\" inom {subject}. Försök omformulera frågan."
            )),
            Err(e) => {
                warn!(error = %e, "Encyclopedia lookup failed");
                Ok(format!(
                    "Kunde inte hitta information om \"{query}\". Försök med en annan fråga."
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(limit: usize) -> SearchInformationTool {
        SearchInformationTool::new(
            reqwest::Client::new(),
            "https://sv.wikipedia.org/w/rest.php/v1".into(),
            limit,
        )
    }

    #[test]
    fn strips_searchmatch_spans() {
        let html = "En <span class=\"searchmatch\">katt</span> är ett husdjur";
        assert_eq!(strip_markup(html), "En katt är ett husdjur");
    }

    #[test]
    fn truncates_on_char_boundary() {
        // Multi-byte Swedish letters must not be split mid-character
        let text = "åäö".repeat(10);
        let cut = truncate_chars(&text, 5);
        assert_eq!(cut, "åäöåä...");
        assert_eq!(truncate_chars("kort", 500), "kort");
    }

    #[test]
    fn render_formats_excerpt_with_source_line() {
        let page = SearchPage {
            title: "Fotosyntes".into(),
            excerpt: Some("<span>Fotosyntes</span> är den process...".into()),
            description: None,
        };
        let output = tool(500).render("fotosyntes", "biologi", page);
        assert!(output.starts_with("Information om \"fotosyntes\" (biologi):"));
        assert!(output.contains("Fotosyntes är den process..."));
        assert!(output.ends_with("Källa: Wikipedia"));
    }

    #[test]
    fn render_falls_back_to_description_then_title() {
        let page = SearchPage {
            title: "Gustav Vasa".into(),
            excerpt: None,
            description: Some("Sveriges kung 1523-1560".into()),
        };
        let output = tool(500).render("gustav vasa", "historia", page);
        assert!(output.contains("Sveriges kung 1523-1560"));

        let bare = SearchPage {
            title: "Gustav Vasa".into(),
            excerpt: None,
            description: None,
        };
        let output = tool(500).render("gustav vasa", "historia", bare);
        assert!(output.contains("Gustav Vasa"));
    }

    #[test]
    fn render_applies_excerpt_cap() {
        let page = SearchPage {
            title: "X".into(),
            excerpt: Some("a".repeat(600)),
            description: None,
        };
        let output = tool(500).render("x", "fysik", page);
        assert!(output.contains(&format!("{}...", "a".repeat(500))));
    }

    #[tokio::test]
    async fn missing_query_is_invalid() {
        let err = tool(500)
            .execute(serde_json::json!({"subject": "biologi"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn tool_definition_uses_wire_name() {
        assert_eq!(tool(500).to_definition().name, "search_information");
    }
}

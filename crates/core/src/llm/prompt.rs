use crate::domain::company::CompanyProfile;
use serde::{Deserialize, Serialize};

/// Plain text already extracted from an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentText {
    pub name: String,
    pub text: String,
}

impl DocumentText {
    /// The text cut to at most `max_chars` characters.
    pub fn capped(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}

pub fn company_info_prompt(query: &str) -> String {
    [
        format!(
            "Find detailed information about the company \"{}\". Provide a JSON response with:",
            query.trim()
        ),
        "{".to_string(),
        "    \"name\": \"Full company name\",".to_string(),
        "    \"symbol\": \"Stock symbol if public, otherwise null\",".to_string(),
        "    \"overview\": \"2-3 sentence business description\",".to_string(),
        "    \"history\": \"2-3 sentence founding and key milestones\",".to_string(),
        "    \"products\": \"Key products and services description\",".to_string(),
        "    \"isPublic\": true/false,".to_string(),
        "    \"industry\": \"Primary industry\"".to_string(),
        "}".to_string(),
    ]
    .join("\n")
}

pub fn document_analysis_prompt(
    company: Option<&CompanyProfile>,
    documents: &[DocumentText],
    max_chars: usize,
) -> String {
    let mut out = String::new();
    match company {
        Some(c) => out.push_str(&format!(
            "You are assisting with pre-LOI due diligence on {} ({}).\n",
            c.name,
            if c.industry.is_empty() { "industry unknown" } else { c.industry.as_str() }
        )),
        None => out.push_str("You are assisting with pre-LOI due diligence on a target company.\n"),
    }
    out.push_str(
        "Analyze the documents below and summarize: key financial figures, customer \
         concentration, revenue model, growth drivers, and red flags. Be concise and factual; \
         say so when the documents do not cover a topic.\n",
    );

    for doc in documents {
        let body = doc.capped(max_chars);
        out.push_str(&format!("\n--- Document: {} ---\n{}\n", doc.name, body));
        if body.len() < doc.text.len() {
            out.push_str("[truncated]\n");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_on_char_boundaries() {
        let doc = DocumentText {
            name: "memo.txt".to_string(),
            text: "héllo wörld".to_string(),
        };
        assert_eq!(doc.capped(2), "hé");
        assert_eq!(doc.capped(100), "héllo wörld");
        assert_eq!(doc.capped(0), "");
    }

    #[test]
    fn document_prompt_truncates_each_document() {
        let docs = vec![
            DocumentText {
                name: "cim.txt".to_string(),
                text: "a".repeat(50),
            },
            DocumentText {
                name: "short.txt".to_string(),
                text: "revenue grew".to_string(),
            },
        ];
        let prompt = document_analysis_prompt(None, &docs, 20);
        assert!(prompt.contains(&format!("--- Document: cim.txt ---\n{}\n[truncated]", "a".repeat(20))));
        assert!(!prompt.contains(&"a".repeat(21)));
        assert!(prompt.contains("revenue grew\n"));
        assert_eq!(prompt.matches("[truncated]").count(), 1);
    }

    #[test]
    fn company_prompt_names_the_query() {
        let p = company_info_prompt("  Tesla ");
        assert!(p.starts_with("Find detailed information about the company \"Tesla\""));
        assert!(p.contains("\"isPublic\""));
    }
}

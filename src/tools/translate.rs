//! Natural-language to SQL translation.

use crate::error::{InsightError, InsightResult};
use crate::llm::CompletionClient;
use crate::llm::prompts;
use crate::tools::schema::SchemaDescriber;
use std::sync::Arc;
use tracing::{debug, info};

/// Turns questions into SQL with a completion model.
///
/// The schema text is fixed at construction; later store changes are not
/// seen until a new translator is built.
pub struct PromptTranslator {
    client: Arc<dyn CompletionClient>,
    schema_context: String,
}

impl PromptTranslator {
    pub fn new(client: Arc<dyn CompletionClient>, schema_context: impl Into<String>) -> Self {
        Self {
            client,
            schema_context: schema_context.into(),
        }
    }

    /// Build a translator grounded on the live store schema.
    pub async fn from_describer(
        client: Arc<dyn CompletionClient>,
        describer: &SchemaDescriber,
    ) -> InsightResult<Self> {
        let schema_context = describer.full_schema_prompt().await?;
        info!(
            model = client.model(),
            schema_chars = schema_context.len(),
            "Translator ready"
        );
        Ok(Self::new(client, schema_context))
    }

    pub fn schema_context(&self) -> &str {
        &self.schema_context
    }

    pub fn build_prompt(&self, question: &str) -> String {
        prompts::query_prompt(&self.schema_context, question)
    }

    pub fn build_analytics_prompt(&self, request: &str) -> String {
        prompts::analytics_prompt(&self.schema_context, request)
    }

    /// Translate a question into a single SQL statement.
    ///
    /// The statement is returned unvalidated.
    pub async fn translate(&self, question: &str) -> InsightResult<String> {
        let prompt = self.build_prompt(question);
        self.complete_sql(&prompt).await
    }

    /// Translate an analysis request into a chart-ready aggregate query.
    pub async fn translate_for_analytics(&self, request: &str) -> InsightResult<String> {
        let prompt = self.build_analytics_prompt(request);
        self.complete_sql(&prompt).await
    }

    async fn complete_sql(&self, prompt: &str) -> InsightResult<String> {
        let raw = self.client.complete(prompt).await?;
        let sql = clean_sql_response(&raw);
        if sql.is_empty() {
            return Err(InsightError::translation(
                "The model returned no SQL after cleaning its response",
            ));
        }
        debug!(sql = %sql, "Generated SQL");
        Ok(sql)
    }
}

/// Strip markdown fences and a leading `sql` / `sql:` label from model output.
pub fn clean_sql_response(raw: &str) -> String {
    let text = raw.trim().replace("```sql", "").replace("```", "");
    let mut text = text.trim();

    if text
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("sql"))
    {
        text = text[3..].trim_start();
    }
    if let Some(rest) = text.strip_prefix(':') {
        text = rest;
    }

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockLlm {
        reply: InsightResult<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockLlm {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for MockLlm {
        async fn complete(&self, prompt: &str) -> InsightResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(InsightError::translation(e.to_string())),
            }
        }

        fn model(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn test_clean_fenced_response() {
        assert_eq!(clean_sql_response("```sql\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(clean_sql_response("```\nSELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn test_clean_sql_label() {
        assert_eq!(clean_sql_response("SQL: SELECT 1"), "SELECT 1");
        assert_eq!(clean_sql_response("sql SELECT 1"), "SELECT 1");
        assert_eq!(clean_sql_response("  SELECT 1  "), "SELECT 1");
    }

    #[test]
    fn test_clean_is_idempotent() {
        for raw in ["```sql\nSELECT 1\n```", "SQL: SELECT 1", "SELECT 1", ""] {
            let once = clean_sql_response(raw);
            assert_eq!(clean_sql_response(&once), once);
        }
    }

    #[test]
    fn test_clean_handles_multibyte_prefix() {
        assert_eq!(clean_sql_response("é"), "é");
        assert_eq!(clean_sql_response("s"), "s");
    }

    #[tokio::test]
    async fn test_translate_sends_question_and_cleans() {
        let llm = MockLlm::replying("```sql\nSELECT COUNT(*) AS total_accounts FROM accounts\n```");
        let translator = PromptTranslator::new(llm.clone(), "DATABASE SCHEMA INFORMATION:\n\n");
        let sql = translator.translate("How many accounts are there?").await.unwrap();
        assert_eq!(sql, "SELECT COUNT(*) AS total_accounts FROM accounts");

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("DATABASE SCHEMA INFORMATION:"));
        assert!(prompts[0].ends_with("Question: \"How many accounts are there?\"\nSQL:"));
    }

    #[tokio::test]
    async fn test_analytics_uses_analytics_prompt() {
        let llm = MockLlm::replying("SELECT market_type, COUNT(*) AS n FROM policies GROUP BY market_type");
        let translator = PromptTranslator::new(llm.clone(), "schema");
        translator
            .translate_for_analytics("Policies by market")
            .await
            .unwrap();
        assert!(llm.prompts.lock().unwrap()[0].contains("LIMIT 20"));
    }

    #[tokio::test]
    async fn test_empty_completion_is_translation_error() {
        let translator = PromptTranslator::new(MockLlm::replying("```sql\n```"), "schema");
        let err = translator.translate("anything").await.unwrap_err();
        assert!(matches!(err, InsightError::Translation { .. }));
    }

    #[tokio::test]
    async fn test_completion_failure_propagates() {
        let llm = Arc::new(MockLlm {
            reply: Err(InsightError::translation("503 Service Unavailable")),
            prompts: Mutex::new(Vec::new()),
        });
        let translator = PromptTranslator::new(llm, "schema");
        let err = translator.translate("anything").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}

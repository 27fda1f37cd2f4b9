//! Prompt templates for SQL generation

/// Builds generation prompts for one SQL dialect
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    dialect: String,
}

impl PromptAssembler {
    pub const DEFAULT_DIALECT: &'static str = "MySQL";

    pub fn new(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
        }
    }

    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    /// Prompt for retrieval-augmented generation.
    ///
    /// Schema and context are embedded verbatim.
    pub fn assemble(&self, schema: &str, context: &str, question: &str) -> String {
        format!(
            "You are an expert {dialect} query generator with access to a curated SQL knowledge base.\n\
            \n\
            Database Schema:\n\
            {schema}\n\
            \n\
            Relevant SQL Knowledge:\n\
            {context}\n\
            \n\
            {rules}\
            \n\
            User Question: {question}\n\
            \n\
            Plain SQL query:",
            dialect = self.dialect,
            schema = schema,
            context = context,
            rules = self.rules(true),
            question = question,
        )
    }

    /// Prompt for generation from the schema alone
    pub fn assemble_direct(&self, schema: &str, question: &str) -> String {
        format!(
            "You are an expert {dialect} query generator.\n\
            \n\
            Database Schema:\n\
            {schema}\n\
            \n\
            {rules}\
            \n\
            User Question: {question}\n\
            \n\
            Plain SQL query:",
            dialect = self.dialect,
            schema = schema,
            rules = self.rules(false),
            question = question,
        )
    }

    fn rules(&self, with_knowledge: bool) -> String {
        let mut rules = vec![
            "Return ONLY the SQL query as plain text".to_string(),
            "Do NOT wrap the query in markdown code blocks (```)".to_string(),
            "Do NOT put the word \"sql\" before the query".to_string(),
            "Do NOT include explanations, comments, or any text before or after the query"
                .to_string(),
            "Use the table and column names from the schema above".to_string(),
        ];
        if with_knowledge {
            rules.push("Apply the patterns and best practices from the SQL knowledge above".to_string());
        }
        rules.extend([
            format!("Write syntactically correct {} that follows its standards", self.dialect),
            "ONLY generate SELECT queries: no INSERT, UPDATE, DELETE, DROP, CREATE, ALTER, or any other DDL/DML"
                .to_string(),
            "Do NOT include semicolons, comments, or UNION operations".to_string(),
        ]);

        let mut text = String::from("CRITICAL INSTRUCTIONS:\n");
        for (i, rule) in rules.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, rule));
        }
        text
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIALECT)
    }
}

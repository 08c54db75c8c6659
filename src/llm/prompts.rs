//! Prompt templates for SQL generation.

/// A worked question/SQL pair shown to the model.
#[derive(Debug, Clone, Copy)]
pub struct Exemplar {
    pub question: &'static str,
    pub sql: &'static str,
}

pub const PERSONA: &str = "You are an expert SQL query generator for an Insurance Company Database.";

pub const QUERY_RULES: &str = r#"IMPORTANT RULES:
1. Return ONLY the SQL query without any markdown, backticks, or explanations
2. Do NOT include "```sql" or "```" or the word "sql" in your response
3. Use proper JOINs when data from multiple tables is needed
4. Use aggregate functions (COUNT, SUM, AVG, MAX, MIN) appropriately
5. Always use table aliases for clarity
6. For date comparisons, use proper date functions
7. Use LIMIT clause for queries that might return many rows"#;

pub const ANALYTICS_RULES: &str = r#"IMPORTANT RULES:
1. Return ONLY the SQL query without any markdown, backticks, or explanations
2. Do NOT include "```sql" or "```" or the word "sql" in your response
3. The result will be charted: return one categorical column followed by one or more numeric columns
4. Give every computed column a descriptive alias (e.g. total_premium, claim_count)
5. Use GROUP BY on the categorical column and aggregate the numeric columns
6. Use ORDER BY so the most significant groups come first
7. Use proper JOINs and table aliases when data from multiple tables is needed
8. Use LIMIT 20 unless the request asks for a different number of groups"#;

pub const QUERY_EXEMPLARS: &[Exemplar] = &[
    Exemplar {
        question: "How many accounts are there?",
        sql: "SELECT COUNT(*) AS total_accounts FROM accounts",
    },
    Exemplar {
        question: "Show all active policies with account names",
        sql: "SELECT a.account_name, p.policy_number, p.policy_type_name, p.premium_amount, p.coverage_amount FROM accounts a JOIN policies p ON a.account_id = p.account_id WHERE p.status = 'Active'",
    },
    Exemplar {
        question: "Which agent has sold the most policies?",
        sql: "SELECT ag.name, COUNT(p.policy_id) AS total_policies FROM agents ag JOIN policies p ON ag.agent_id = p.agent_id GROUP BY ag.name ORDER BY total_policies DESC LIMIT 1",
    },
    Exemplar {
        question: "Show accounts with total claim amounts",
        sql: "SELECT a.account_name, SUM(c.claim_amount) AS total_claims FROM accounts a JOIN claims c ON a.account_id = c.account_id GROUP BY a.account_name",
    },
    Exemplar {
        question: "How many quotes were issued as policies?",
        sql: "SELECT COUNT(*) AS issued_quotes FROM quoted_policies q JOIN issued_policies ip ON q.quote_id = ip.quote_id",
    },
];

pub const ANALYTICS_EXEMPLARS: &[Exemplar] = &[
    Exemplar {
        question: "Premium by market type",
        sql: "SELECT p.market_type, SUM(p.premium_amount) AS total_premium, COUNT(p.policy_id) AS policy_count FROM policies p WHERE p.status = 'Active' GROUP BY p.market_type ORDER BY total_premium DESC LIMIT 20",
    },
    Exemplar {
        question: "Claim amounts by claim type",
        sql: "SELECT c.claim_type, SUM(c.claim_amount) AS total_requested, SUM(c.approved_amount) AS total_approved FROM claims c GROUP BY c.claim_type ORDER BY total_requested DESC LIMIT 20",
    },
    Exemplar {
        question: "Open reserves per adjuster",
        sql: "SELECT oc.adjuster, COUNT(oc.ongoing_claim_id) AS open_claims, SUM(oc.reserve_amount) AS total_reserve FROM ongoing_claims oc GROUP BY oc.adjuster ORDER BY total_reserve DESC LIMIT 20",
    },
];

/// Sample questions users can ask, grouped by topic.
#[derive(Debug, Clone, Copy)]
pub struct QuestionCategory {
    pub title: &'static str,
    pub questions: &'static [&'static str],
}

pub const EXAMPLE_QUESTIONS: &[QuestionCategory] = &[
    QuestionCategory {
        title: "Account & Policy Queries",
        questions: &[
            "How many accounts are in each state?",
            "Show all Middle Market policies",
            "List National Account accounts with premiums over $100k",
            "Which accounts have both GC and LS policies?",
        ],
    },
    QuestionCategory {
        title: "Market Analysis",
        questions: &[
            "What is the total premium by market type?",
            "Show average premium for Public Sector",
            "Compare GC vs LS policy counts",
            "Which market has the highest claim ratio?",
        ],
    },
    QuestionCategory {
        title: "Claims Queries",
        questions: &[
            "Show all ongoing claims with amounts over $100k",
            "List pending claims by account",
            "What's the total claim exposure?",
            "Show claims by adjuster",
        ],
    },
    QuestionCategory {
        title: "Agent Performance",
        questions: &[
            "Which agent has the most policies?",
            "Show agents ranked by total premium",
            "List agents handling Public Sector accounts",
        ],
    },
    QuestionCategory {
        title: "Quote & Issuance",
        questions: &[
            "Show all pending quotes",
            "What's the quote acceptance rate by market?",
            "List recently issued policies",
            "Show quotes that expired without acceptance",
        ],
    },
    QuestionCategory {
        title: "Complex Queries",
        questions: &[
            "Show accounts with ongoing claims and their policies",
            "Compare premium vs claims by market type",
            "List agents with National Account clients",
            "Show policy issuance trends by month",
        ],
    },
];

/// A canned analysis request, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticsPreset {
    pub name: &'static str,
    pub label: &'static str,
    pub request: &'static str,
}

pub const ANALYTICS_PRESETS: &[AnalyticsPreset] = &[
    AnalyticsPreset {
        name: "premium-by-market",
        label: "Premium by Market Type",
        request: "Show total premium amount grouped by market type",
    },
    AnalyticsPreset {
        name: "policy-distribution",
        label: "Policy Distribution",
        request: "Show count of policies by market type and policy type",
    },
    AnalyticsPreset {
        name: "claim-risk",
        label: "Claim Risk Assessment",
        request: "Show total claim amount vs total premium by market type to assess risk",
    },
    AnalyticsPreset {
        name: "agent-performance",
        label: "Agent Performance",
        request: "Show agents with their total policies and premium amount ranked by premium",
    },
    AnalyticsPreset {
        name: "quote-conversion",
        label: "Quote Conversion",
        request: "Show quote conversion rate by market type with counts and percentages",
    },
    AnalyticsPreset {
        name: "ongoing-claims",
        label: "Ongoing Claims Analysis",
        request: "Show ongoing claims grouped by status with total amounts",
    },
];

/// Look up a preset by name, ignoring case.
pub fn find_preset(name: &str) -> Option<&'static AnalyticsPreset> {
    let name = name.trim();
    ANALYTICS_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Plain-text listing of the example questions and presets.
pub fn render_catalogue() -> String {
    let mut out = String::from("Example questions (insightiq ask \"...\"):\n");
    for category in EXAMPLE_QUESTIONS {
        out.push_str(&format!("\n{}:\n", category.title));
        for question in category.questions {
            out.push_str(&format!("  - {question}\n"));
        }
    }
    out.push_str("\nAnalytics presets (insightiq analytics --preset <name>):\n\n");
    for preset in ANALYTICS_PRESETS {
        out.push_str(&format!(
            "  {:<20} {}: {}\n",
            preset.name, preset.label, preset.request
        ));
    }
    out
}

fn render_exemplars(exemplars: &[Exemplar]) -> String {
    exemplars
        .iter()
        .map(|e| format!("Question: \"{}\"\nSQL: {}\n", e.question, e.sql))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render(
    schema_context: &str,
    rules: &str,
    exemplars: &[Exemplar],
    intro: &str,
    input: &str,
) -> String {
    format!(
        "{PERSONA}\n\n{schema_context}\n\n{rules}\n\nEXAMPLE QUERIES:\n\n{}\n{intro}\nQuestion: \"{input}\"\nSQL:",
        render_exemplars(exemplars)
    )
}

/// Prompt for a plain question.
pub fn query_prompt(schema_context: &str, question: &str) -> String {
    render(
        schema_context,
        QUERY_RULES,
        QUERY_EXEMPLARS,
        "Now convert this question to SQL:",
        question,
    )
}

/// Prompt for a chart-ready aggregate.
pub fn analytics_prompt(schema_context: &str, request: &str) -> String {
    render(
        schema_context,
        ANALYTICS_RULES,
        ANALYTICS_EXEMPLARS,
        "Now write the analysis query for this request:",
        request,
    )
}

//! Prompt templates for LLM interactions

/// Prompt for reducing one representative segment to a summary
pub struct SummaryPrompt;

impl SummaryPrompt {
    pub fn generate(segment_text: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str(SUMMARY_SYSTEM_PROMPT);
        prompt.push('\n');
        prompt.push_str(&format!("Text: ```{}```\n\n", segment_text.trim()));
        prompt.push_str(SUMMARY_INSTRUCTIONS);

        prompt
    }
}

/// Prompt for merging segment summaries into one checklist prompt
pub struct SynthesisPrompt;

impl SynthesisPrompt {
    /// Summaries are joined with newlines, in the order given
    pub fn generate(summaries: &[String]) -> String {
        let mut prompt = String::new();

        prompt.push_str(SYNTHESIS_SYSTEM_PROMPT);
        prompt.push('\n');
        prompt.push_str(&format!("Summarized Text: ```{}```\n\n", summaries.join("\n")));
        prompt.push_str(SYNTHESIS_INSTRUCTIONS);

        prompt
    }
}

/// Checklist-authoring prompts, one per ceiling policy
pub struct ChecklistPrompt;

impl ChecklistPrompt {
    /// Detailed checklist with a minimum task target and nested subtasks
    pub fn detailed(user_prompt: &str, min_tasks: usize) -> String {
        let mut prompt = Self::header(user_prompt);

        prompt.push_str(CHECKLIST_RULES);
        prompt.push_str(
            "    - Generate detailed tasks: break larger tasks into subtasks, nesting deeper where it helps\n",
        );
        prompt.push_str(
            "    - Add metadata: give each task a description, a priority (Low/Medium/High) and a time estimate where you can\n",
        );
        prompt.push_str(&format!(
            "    - Number of tasks: produce at least {} tasks and subtasks\n\n",
            min_tasks
        ));
        prompt.push_str(CHECKLIST_CLOSING);

        prompt
    }

    /// Flat checklist with a hard cap on top-level tasks and no subtasks
    pub fn flat(user_prompt: &str, max_tasks: usize) -> String {
        let mut prompt = Self::header(user_prompt);

        prompt.push_str(CHECKLIST_RULES);
        prompt.push_str("    - Keep it flat: do not create subtasks\n");
        prompt.push_str(&format!(
            "    - Number of tasks: produce at most {} tasks. This is mandatory.\n\n",
            max_tasks
        ));
        prompt.push_str(CHECKLIST_CLOSING);

        prompt
    }

    /// Checklist whose tasks and subtasks together stay under a cap
    pub fn combined(user_prompt: &str, max_total: usize) -> String {
        let mut prompt = Self::header(user_prompt);

        prompt.push_str(CHECKLIST_RULES);
        prompt.push_str(&format!(
            "    - Number of tasks: the total of tasks plus subtasks must not exceed {}. This is mandatory.\n",
            max_total
        ));
        prompt.push_str(
            "    - Budget: if there are fewer top-level tasks than the limit, spend the rest on subtasks without going over the total\n\n",
        );
        prompt.push_str(CHECKLIST_CLOSING);

        prompt
    }

    fn header(user_prompt: &str) -> String {
        let mut prompt = String::new();
        prompt.push_str(CHECKLIST_SYSTEM_PROMPT);
        prompt.push('\n');
        prompt.push_str(&format!("Prompt: \"{}\"\n\n", user_prompt.trim()));
        prompt
    }
}

/// Prompt turning raw text straight into a bounded checklist
pub struct DirectTextPrompt;

impl DirectTextPrompt {
    pub fn generate(text: &str, extra_prompt: Option<&str>, max_total: usize) -> String {
        let mut prompt = String::new();

        prompt.push_str(DIRECT_SYSTEM_PROMPT);
        prompt.push('\n');
        prompt.push_str(&format!("Text: ```{}```\n\n", text.trim()));
        prompt.push_str("Instructions:\n");
        prompt.push_str("- Take the actionable tasks from the text as written, without paraphrasing\n");
        prompt.push_str("- Cover all of the provided text\n");
        prompt.push_str(&format!(
            "- The total of tasks plus subtasks must not exceed {}. Merge or prioritize tasks to stay within the limit. This is mandatory.\n",
            max_total
        ));
        prompt.push_str("- Create subtasks for major tasks where possible\n");
        prompt.push_str("- Keep every task clear and concise\n");
        prompt.push_str("- Return the complete checklist, never a partial one\n");

        if let Some(extra) = extra_prompt.map(str::trim).filter(|e| !e.is_empty()) {
            prompt.push_str("- Use the additional prompt to refine or expand the checklist\n");
            prompt.push_str(&format!("\nAdditional Prompt: ```{}```\n", extra));
        }

        prompt
    }
}

/// Prompt for the status label vocabulary of a checklist
pub struct StatusIndicatorPrompt;

impl StatusIndicatorPrompt {
    /// `tasks` are top-level task titles
    pub fn generate(title: &str, tasks: &[String]) -> String {
        let mut prompt = String::new();

        prompt.push_str(STATUS_SYSTEM_PROMPT);
        prompt.push('\n');
        prompt.push_str(&format!("Checklist: \"{}\"\n", title));
        prompt.push_str(&format!("Tasks: \"{}\"\n\n", tasks.join(", ")));
        prompt.push_str(STATUS_INSTRUCTIONS);

        prompt
    }
}

/// Prompt for the metadata of a single task
pub struct TaskMetadataPrompt;

impl TaskMetadataPrompt {
    pub fn generate(checklist: &str, task: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str(METADATA_SYSTEM_PROMPT);
        prompt.push('\n');
        prompt.push_str(&format!("Checklist: \"{}\"\n", checklist));
        prompt.push_str(&format!("Task: \"{}\"\n\n", task));
        prompt.push_str(METADATA_INSTRUCTIONS);

        prompt
    }
}

/// Prompt turning a short checklist brief into a refined generation prompt
pub struct RefinePrompt;

impl RefinePrompt {
    pub fn generate(
        name: &str,
        team: &str,
        organization: Option<&str>,
        role: Option<&str>,
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str(REFINE_SYSTEM_PROMPT);
        prompt.push('\n');
        prompt.push_str(&format!("Checklist name: \"{}\"\n", name.trim()));
        prompt.push_str(&format!("Team or project: \"{}\"\n", team.trim()));
        if let Some(organization) = organization.map(str::trim).filter(|o| !o.is_empty()) {
            prompt.push_str(&format!("Organization: \"{}\"\n", organization));
        }
        if let Some(role) = role.map(str::trim).filter(|r| !r.is_empty()) {
            prompt.push_str(&format!("Role: \"{}\"\n", role));
        }
        prompt.push('\n');
        prompt.push_str(REFINE_INSTRUCTIONS);

        prompt
    }
}

/// Prompt for example prompts a user could start from
pub struct SamplePromptsPrompt;

impl SamplePromptsPrompt {
    pub fn generate(job_role: &str, industry: &str, count: usize) -> String {
        format!(
            "You are a professional prompt engineer writing sample prompts for a checklist generator.\n\
             Write {} distinct prompts, each no longer than 10 words, that a {} in the {} industry \
             could use to create a checklist.\n\n\
             Each prompt must be specific, unique and clear. Give only the prompt text, no numbering.\n",
            count, job_role, industry
        )
    }
}

const SUMMARY_SYSTEM_PROMPT: &str = r#"You are an expert summarizer. Summarize the text below, which is enclosed in triple backticks.
"#;

const SUMMARY_INSTRUCTIONS: &str = r#"Rules:
- Write one paragraph that gives the reader a full understanding of the text
- Keep it concise and easy to read
- Phrase it so it can serve as a prompt for generating a checklist
"#;

const SYNTHESIS_SYSTEM_PROMPT: &str = r#"You are an expert prompt writer for checklist creation. Write one checklist-generation prompt from the summarized text below.
"#;

const SYNTHESIS_INSTRUCTIONS: &str = r#"Rules:
- The prompt should be concise and easy to read
- It must ask for a checklist covering the summarized text
"#;

const CHECKLIST_SYSTEM_PROMPT: &str = r#"You are an expert checklist creator. Create a very clear checklist from the prompt below.
"#;

const CHECKLIST_RULES: &str = r#"Rules:
    - Ask relevant questions: question yourself to improve the quality of the checklist
    - Identify the tasks: list every task needed to reach the goal, as specific as possible
    - Prioritize tasks: order tasks by dependencies, time constraints and importance
"#;

const CHECKLIST_CLOSING: &str = r#"Begin, and remember to ask relevant questions to improve the checklist.
"#;

const DIRECT_SYSTEM_PROMPT: &str = r#"You are an expert checklist creator. Create a checklist directly from the text below.
"#;

const REFINE_SYSTEM_PROMPT: &str = r#"You are a master checklist prompt writer. Turn the checklist brief below into the best possible prompt for creating that checklist.
"#;

const REFINE_INSTRUCTIONS: &str = r#"Rules:
- Bring in the standards, guidelines and methodologies of the team's field
- Ask yourself relevant questions about the goal and fold the answers into the prompt
- Review and improve the prompt three times before answering
- The final prompt must be well refined and actionable
- Answer with the final prompt only, as plain text
"#;

const STATUS_SYSTEM_PROMPT: &str = r#"You generate status indicators for checklist tasks. Produce a set of status indicators that convey the current state of any item on the checklist below. Only a few of its tasks are listed.
"#;

const STATUS_INSTRUCTIONS: &str = r#"Rules:
- The indicators must fit the purpose of the checklist and apply to every task
- Exactly one positive indicator, in the past tense
- Exactly one negative indicator, in the past tense
- Exactly one reaction to the negative indicator (for example "Needs attention" or "Needs review")
- No in-progress states such as "Pending", "On hold" or "In progress"
- Add "Not Applicable (N/A)" as the last indicator only if it is needed
- Each indicator is one to three words
- At most 4 unique indicators
"#;

const METADATA_SYSTEM_PROMPT: &str = r#"You are an expert at writing task metadata. Create clear metadata for the task of the checklist below.
"#;

const METADATA_INSTRUCTIONS: &str = r#"Rules:
- Ask yourself relevant questions to improve the quality of the metadata
- Write a detailed description that explains the task
- List references where they apply
"#;

/// Output shape for checklist generation
pub const CHECKLIST_SCHEMA: &str = r#"The output should be a markdown code snippet in the following schema, including the leading "```json" and trailing "```":

```json
{
    "title": "", // checklist title
    "tasks": [ // tasks of the checklist
        {
            "title": "", // task title
            "description": "", // optional
            "priority": "", // optional: Low, Medium or High
            "time_estimate": "", // optional
            "subtasks": [ // optional, same shape as a task
            ]
        }
    ]
}
```"#;

/// Output shape for flat checklists
pub const FLAT_CHECKLIST_SCHEMA: &str = r#"The output should be a markdown code snippet in the following schema, including the leading "```json" and trailing "```":

```json
{
    "title": "", // checklist title
    "tasks": [ // tasks of the checklist, no subtasks
        {
            "title": "", // task title
            "priority": "" // optional: Low, Medium or High
        }
    ]
}
```"#;

/// Output shape for direct-text checklists
pub const DIRECT_CHECKLIST_SCHEMA: &str = r#"The output should be a markdown code snippet in the following schema, including the leading "```json" and trailing "```":

```json
{
    "title": "", // checklist title based on the text
    "tasks": [
        {
            "title": "", // main task
            "subtasks": [ // subtasks of the task
                ""
            ]
        }
    ]
}
```"#;

/// Output shape for status indicators
pub const STATUS_INDICATOR_SCHEMA: &str = r#"The output should be a markdown code snippet in the following schema, including the leading "```json" and trailing "```":

```json
{
    "status_indicators": [
        // status indicators as strings
    ]
}
```"#;

/// Output shape for task metadata
pub const TASK_METADATA_SCHEMA: &str = r#"The output should be a markdown code snippet in the following schema, including the leading "```json" and trailing "```":

```json
{
    "description": "", // detailed description of the task
    "references": [], // links that help complete the task
    "completion_criteria": "", // criteria that define successful completion
    "complexity": "", // Low, Medium or High
    "priority": "", // Low, Medium or High
    "estimated_time_to_complete": "", // minutes, as a number
    "frequency": "", // Daily, Monthly, Quarterly or Yearly
    "instructions": [] // step by step instructions
}
```"#;

/// Output shape for sample prompts
pub const SAMPLE_PROMPTS_SCHEMA: &str = r#"Output only valid JSON in exactly this form, without extra keys:

```json
{
    "prompts": [
        "prompt text"
    ]
}
```"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prompt_generation() {
        let prompt = SummaryPrompt::generate("  Inspect fire exits weekly.  ");
        assert!(prompt.contains("```Inspect fire exits weekly.```"));
        assert!(prompt.contains("Summarize"));
    }

    #[test]
    fn test_synthesis_joins_in_order() {
        let prompt = SynthesisPrompt::generate(&["first".to_string(), "second".to_string()]);
        assert!(prompt.contains("```first\nsecond```"));
    }

    #[test]
    fn test_checklist_prompt_ceilings() {
        assert!(ChecklistPrompt::detailed("Onboard a hire", 15).contains("at least 15"));
        assert!(ChecklistPrompt::flat("Onboard a hire", 10).contains("at most 10"));
        let combined = ChecklistPrompt::combined("Onboard a hire", 15);
        assert!(combined.contains("must not exceed 15"));
        assert!(combined.contains("\"Onboard a hire\""));
    }

    #[test]
    fn test_direct_prompt_additional_prompt() {
        let without = DirectTextPrompt::generate("Text body", None, 15);
        assert!(!without.contains("Additional Prompt"));

        let blank = DirectTextPrompt::generate("Text body", Some("   "), 15);
        assert!(!blank.contains("Additional Prompt"));

        let with = DirectTextPrompt::generate("Text body", Some("Focus on safety"), 15);
        assert!(with.contains("Additional Prompt: ```Focus on safety```"));
    }

    #[test]
    fn test_status_prompt_joins_tasks() {
        let prompt = StatusIndicatorPrompt::generate(
            "Kitchen audit",
            &["Check fridge".to_string(), "Clean oven".to_string()],
        );
        assert!(prompt.contains("Checklist: \"Kitchen audit\""));
        assert!(prompt.contains("Tasks: \"Check fridge, Clean oven\""));
    }

    #[test]
    fn test_refine_prompt_optional_fields() {
        let prompt = RefinePrompt::generate(" On-page SEO ", "SEO", None, Some("  "));
        assert!(prompt.contains("Checklist name: \"On-page SEO\""));
        assert!(prompt.contains("Team or project: \"SEO\""));
        assert!(!prompt.contains("Organization:"));
        assert!(!prompt.contains("Role:"));

        let full = RefinePrompt::generate("Release", "Mobile", Some("Acme"), Some("QA lead"));
        assert!(full.contains("Organization: \"Acme\""));
        assert!(full.contains("Role: \"QA lead\""));
    }

    #[test]
    fn test_schemas_are_fenced() {
        for schema in [
            CHECKLIST_SCHEMA,
            FLAT_CHECKLIST_SCHEMA,
            DIRECT_CHECKLIST_SCHEMA,
            STATUS_INDICATOR_SCHEMA,
            TASK_METADATA_SCHEMA,
            SAMPLE_PROMPTS_SCHEMA,
        ] {
            assert!(schema.contains("```json\n{"));
        }
    }
}

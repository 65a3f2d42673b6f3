//! Guided research workflows exposed as MCP prompts.
//!
//! Prompt arguments arrive as strings. Each prompt renders a single user
//! message that walks the agent through the tools in order.

use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PromptArgument {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

pub struct PromptSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: &'static [PromptArgument],
    render: fn(&PromptArgs) -> Result<String, String>,
}

#[derive(Debug, Serialize)]
pub struct PromptDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: &'static [PromptArgument],
}

impl PromptSpec {
    pub fn descriptor(&self) -> PromptDescriptor {
        PromptDescriptor {
            name: self.name,
            description: self.description,
            arguments: self.arguments,
        }
    }

    /// Render the prompt text after checking required arguments.
    pub fn render(&self, arguments: HashMap<String, String>) -> Result<String, String> {
        let args = PromptArgs(arguments);
        let missing: Vec<_> = self
            .arguments
            .iter()
            .filter(|arg| arg.required && args.get(arg.name).is_none())
            .map(|arg| arg.name)
            .collect();
        if !missing.is_empty() {
            return Err(format!(
                "Prompt '{}' is missing required argument(s): {}",
                self.name,
                missing.join(", ")
            ));
        }
        (self.render)(&args)
    }
}

struct PromptArgs(HashMap<String, String>);

impl PromptArgs {
    /// Non-blank value of an argument.
    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    fn list(&self, name: &str) -> Vec<&str> {
        self.get(name)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub const PROMPTS: &[PromptSpec] = &[
    PromptSpec {
        name: "research_deep_dive",
        description: "Guide an in-depth research session on a topic.",
        arguments: &[
            PromptArgument {
                name: "topic",
                description: "The research topic to investigate",
                required: true,
            },
            PromptArgument {
                name: "num_sources",
                description: "Number of initial sources to find (default: 3)",
                required: false,
            },
        ],
        render: research_deep_dive,
    },
    PromptSpec {
        name: "comparative_analysis",
        description: "Guide a comparative analysis across multiple sources.",
        arguments: &[
            PromptArgument {
                name: "topic",
                description: "The topic or question for comparison",
                required: true,
            },
            PromptArgument {
                name: "source_urls",
                description: "Comma-separated URLs to compare",
                required: true,
            },
        ],
        render: comparative_analysis,
    },
    PromptSpec {
        name: "content_brief",
        description: "Guide content creation from research sources.",
        arguments: &[
            PromptArgument {
                name: "topic",
                description: "The topic for content creation",
                required: true,
            },
            PromptArgument {
                name: "content_type",
                description: "blog_post, report or presentation (default: blog_post)",
                required: false,
            },
        ],
        render: content_brief,
    },
    PromptSpec {
        name: "rag_setup",
        description: "Set up a notebook as a knowledge base for ongoing source-grounded Q&A.",
        arguments: &[
            PromptArgument {
                name: "knowledge_base_name",
                description: "Name for the knowledge base",
                required: true,
            },
            PromptArgument {
                name: "source_urls",
                description: "Optional comma-separated URLs to pre-load",
                required: false,
            },
        ],
        render: rag_setup,
    },
];

pub fn find(name: &str) -> Option<&'static PromptSpec> {
    PROMPTS.iter().find(|prompt| prompt.name == name)
}

fn bullet_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("   - {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn research_deep_dive(args: &PromptArgs) -> Result<String, String> {
    let topic = args.get_or("topic", "");
    let num_sources: u32 = match args.get("num_sources") {
        Some(raw) => raw
            .parse()
            .map_err(|_| format!("num_sources must be a whole number, got '{}'", raw))?,
        None => 3,
    };

    Ok(format!(
        "I want to conduct a deep research session on: {topic}\n\n\
         Please follow these steps:\n\
         1. Create a new notebook titled 'Research: {topic}'\n\
         2. Search the web for {num_sources} high-quality sources on this topic using research_web with mode='deep'\n\
         3. Add any additional relevant URLs as sources\n\
         4. Ask comprehensive questions to extract key insights:\n   \
            - What are the main themes and findings?\n   \
            - What are the different perspectives or approaches?\n   \
            - What are the key data points or evidence?\n   \
            - What are the gaps or limitations?\n\
         5. Generate a briefing document report\n\
         6. Summarize the key findings for me\n\n\
         Start by creating the notebook and running web research."
    ))
}

fn comparative_analysis(args: &PromptArgs) -> Result<String, String> {
    let topic = args.get_or("topic", "");
    let urls = args.list("source_urls");

    Ok(format!(
        "I want to do a comparative analysis on: {topic}\n\n\
         Sources to compare:\n{}\n\n\
         Steps:\n\
         1. Create a notebook for this analysis\n\
         2. Add all {} URLs as sources\n\
         3. Ask these comparison questions:\n   \
            - What are the similarities across these sources?\n   \
            - What are the key differences?\n   \
            - Where do they agree and disagree?\n   \
            - What unique insights does each source provide?\n\
         4. Generate a data table comparing key aspects\n\
         5. Generate a mind map of the relationships\n\
         6. Create a briefing document with the comparison\n\n\
         Start by creating the notebook and adding the sources.",
        bullet_list(&urls),
        urls.len()
    ))
}

fn content_brief(args: &PromptArgs) -> Result<String, String> {
    let topic = args.get_or("topic", "");
    let content_type = args.get_or("content_type", "blog_post");

    Ok(format!(
        "I want to create a {content_type} about: {topic}\n\n\
         Steps:\n\
         1. Create a research notebook for '{topic}'\n\
         2. Run web research to find authoritative sources\n\
         3. Analyze the sources with Q&A to extract key points\n\
         4. Generate a {content_type} report from the sources\n\
         5. Also generate:\n   \
            - A mind map for structure overview\n   \
            - Key flashcards for quick reference\n\
         6. Download all generated artifacts\n\n\
         Start with research and then generate the content."
    ))
}

fn rag_setup(args: &PromptArgs) -> Result<String, String> {
    let name = args.get_or("knowledge_base_name", "");
    let urls = args.list("source_urls");

    let mut text = format!(
        "I want to set up a RAG knowledge base called: {name}\n\n\
         Steps:\n\
         1. Create a notebook titled '{name}'\n"
    );
    if urls.is_empty() {
        text.push_str("2. (No initial sources - I'll add them later)\n");
    } else {
        text.push_str(&format!("2. Add these initial sources:\n{}\n", bullet_list(&urls)));
    }
    text.push_str(
        "3. Configure the chat persona for Q&A:\n   \
         - Set a custom prompt for accurate, citation-heavy responses\n\
         4. Test with a sample question to verify it's working\n\
         5. Return the notebook ID so I can use it for future Q&A\n\n\
         This notebook will be used as a persistent RAG backend. \
         I'll query it using chat_ask for source-grounded answers.",
    );
    Ok(text)
}

//! Prompt templates and marker substitution.
use std::path::Path;

use figment::providers::{Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::warn;

use fdqa_core::config::{expand_path, PromptSettings};
use fdqa_core::{Error, Result};

pub const EXAMPLES_MARKER: &str = "%examples%";
pub const CONTEXT_MARKER: &str = "%context%";
pub const QUESTION_MARKER: &str = "%question%";

/// Substitutes the examples, context and question markers in one left-to-right
/// pass. Context and query are trimmed. Inserted text is never scanned for
/// markers, and a marker missing from the template is simply not replaced.
pub fn build(template: &str, query: &str, context: &str, examples: &str) -> String {
    let replacements = [
        (EXAMPLES_MARKER, examples),
        (CONTEXT_MARKER, context.trim()),
        (QUESTION_MARKER, query.trim()),
    ];
    let mut out = String::with_capacity(template.len() + context.len() + examples.len() + query.len());
    let mut rest = template;
    loop {
        let next = replacements
            .iter()
            .filter_map(|(marker, value)| rest.find(marker).map(|pos| (pos, *marker, *value)))
            .min_by_key(|(pos, _, _)| *pos);
        match next {
            Some((pos, marker, value)) => {
                out.push_str(&rest[..pos]);
                out.push_str(value);
                rest = &rest[pos + marker.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

const DEFAULT_SYSTEM_INSTRUCTION: &str = "당신은 프랜차이즈 가맹점주를 위한 전문 Q&A 어시스턴트입니다. \
가맹본부 및 가맹점 관련 정보(예: 월매출, 가맹비, 로열티 등)로 구성된 문서를 사용하여 질문에 답변하세요. \
반드시 제공받은 context를 기반으로만 답변해야 하며, 별도로 지식을 추가하거나 재구성해서는 안 됩니다. \
만약 질문이 제공된 context와 관련이 없거나, 답변할 정보가 없다면 '문서에 없는 내용입니다. 다시 질문해주세요.'라고 답변하세요. \
모든 답변은 친절하고 정확하게 작성하되, 추측은 절대 하지 마세요.";

const DEFAULT_BASIC_TEMPLATE: &str = "다음 정보공개서 내용만을 근거로 질문에 답하세요.

[문서]
%context%

[질문]
%question%

[답변]
";

const DEFAULT_FEWSHOT_TEMPLATE: &str = "다음은 같은 유형의 질문과 모범 답변 예시입니다.

%examples%

위 예시의 형식을 참고하여, 아래 정보공개서 내용만을 근거로 질문에 답하세요.

[문서]
%context%

[질문]
%question%

[답변]
";

/// Layout of the basic question-answering prompt; the system instruction is
/// prepended.
const ANSWER_LAYOUT: &str = "컨텍스트:
%context%

사용자 질문: %question%

답변:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplates {
    pub basic_template: String,
    pub fewshot_template: String,
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
}

fn default_system_instruction() -> String {
    DEFAULT_SYSTEM_INSTRUCTION.to_string()
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            basic_template: DEFAULT_BASIC_TEMPLATE.to_string(),
            fewshot_template: DEFAULT_FEWSHOT_TEMPLATE.to_string(),
            system_instruction: default_system_instruction(),
        }
    }
}

impl PromptTemplates {
    /// Loads the configured template file. Only the default location may be
    /// missing, in which case the built-in set is used.
    pub fn from_settings(settings: &PromptSettings) -> Result<Self> {
        let path = expand_path(&settings.template_path);
        if !path.exists() && settings.template_path == PromptSettings::default().template_path {
            warn!(path = %path.display(), "prompt template file not found, using built-in templates");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Reads a TOML template file. Both named templates are required.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::InvalidConfig(format!("prompt template file {} not found", path.display())));
        }
        Figment::from(Toml::file(path))
            .extract()
            .map_err(|e| Error::InvalidConfig(format!("prompt templates in {}: {e}", path.display())))
    }

    pub fn basic(&self, query: &str, context: &str) -> String {
        build(&self.basic_template, query, context, "")
    }

    pub fn fewshot(&self, query: &str, context: &str, examples: &str) -> String {
        build(&self.fewshot_template, query, context, examples)
    }

    /// System instruction, assembled context and question for the direct answer flow.
    pub fn answer(&self, query: &str, context: &str) -> String {
        format!("{}\n\n{}", self.system_instruction.trim(), build(ANSWER_LAYOUT, query, context, ""))
    }
}

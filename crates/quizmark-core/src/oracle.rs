//! Scoring oracle adapter.
//!
//! Turns a question and a candidate answer into a chat-completion request,
//! then repairs, parses and validates the JSON verdict. The grading policy
//! (short-but-valid answers, disengagement, "don't know") lives in the
//! system instruction; this module only enforces the structural contract.
//!
//! Hint, framework and weakness-analysis calls are advisory and always
//! resolve to some text.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{GradingError, DEFAULT_MODEL};
use crate::model::{GradingResult, ProgressMap, Question};
use crate::traits::{ChatRequest, LlmProvider};

/// Tracing target that receives raw oracle replies when echo is enabled.
pub const ECHO_TARGET: &str = "quizmark::oracle_echo";

const HINT_EMPTY: &str = "無法生成提示。";
const HINT_UNAVAILABLE: &str = "提示功能暫時無法使用。";
const FRAMEWORK_EMPTY: &str = "無法生成答題框架。";
const FRAMEWORK_UNAVAILABLE: &str = "框架功能暫時無法使用。";
const ANALYSIS_EMPTY: &str = "暫時無法分析弱點。";
const ANALYSIS_UNAVAILABLE: &str = "分析功能暫時不可用。";

const GRADING_INSTRUCTION: &str = r#"You are the chief examiner for the HKDSE Chinese Language paper. Grade the candidate's answer strictly against the official rubric. Write every comment in Traditional Chinese.

Seriousness rules:
1. Judge seriousness in context. Very short answers are normal and valid for multiple-choice (e.g. "A"), vocabulary (a single word) and true/false items. For true/false items accept any form that expresses a judgement (是/否, 對/錯, T/F, Yes/No) in any combination, such as "T 錯". Never treat such answers as non-serious.
2. Only meaningless input (random letters, digit strings) or text unrelated to the question is non-serious. For a non-serious answer: set every hit to false and every awardedScore to 0, set totalScore to 0, return an EMPTY feedback array, and use overallComment to point out the attitude problem. Never reveal the correct answer in this case.
3. If the candidate honestly says they do not know, return an EMPTY feedback array and an encouraging overallComment.
4. Every feedback item must carry a comment, whether the point was hit or missed.
5. pointIndex is 0-based and must refer to an entry of the rubric.

Marking granularity:
- label "exact": the answer must quote the set text.
- label "point": paraphrase is accepted if the meaning is right.
- analysis items need textual evidence and a line of reasoning, not a bare verdict.

Output exactly one JSON object and nothing else. Use ASCII double quotes for every JSON string; never substitute 「 or 」 for them.
{
  "totalScore": number,
  "maxScore": number (the question's full marks),
  "feedback": [{"pointIndex": number, "awardedScore": number, "hit": boolean, "comment": string}],
  "overallComment": string
}"#;

const HINT_INSTRUCTION: &str = "You are an experienced HKDSE Chinese tutor. Give one short hint for the question, in Traditional Chinese, at most 50 characters, Markdown allowed. Output only the hint itself with no label or prefix such as \"提示：\" or \"Hint:\", and do not give away the answer.";

const FRAMEWORK_INSTRUCTION: &str = "You are an HKDSE Chinese teaching assistant. Output only an answer framework for the question in Traditional Chinese Markdown (for example under a heading \"### 答題框架\"). No greetings or reassurance, do not restate the question, and never reveal any correct answer.";

const ANALYSIS_INSTRUCTION: &str = "You are an HKDSE Chinese learning analyst. The data is a student's history of weak questions, including every attempt at each one. Look at the trend across attempts and call out stubborn errors: the same mistake repeated after retrying. Summarise the three main weaknesses with concrete advice for each. Answer in Traditional Chinese Markdown, encouraging and professional, with no introduction.";

/// Settings injected into the adapter at construction.
#[derive(Debug, Clone)]
pub struct OracleSettings {
    /// Model identifier sent with every request.
    pub model: String,
    /// Mirror raw replies to [`ECHO_TARGET`].
    pub debug_echo: bool,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            debug_echo: false,
        }
    }
}

/// LLM-backed rubric grader and study advisor.
pub struct RubricOracle {
    provider: Arc<dyn LlmProvider>,
    settings: OracleSettings,
}

impl RubricOracle {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: OracleSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &OracleSettings {
        &self.settings
    }

    async fn ask(
        &self,
        system_prompt: &str,
        prompt: String,
        json_response: bool,
    ) -> Result<String, GradingError> {
        let request = ChatRequest {
            model: self.settings.model.clone(),
            system_prompt: system_prompt.to_string(),
            prompt,
            json_response,
        };
        let response = self.provider.complete(&request).await?;
        if self.settings.debug_echo {
            info!(target: ECHO_TARGET, model = %response.model, "{}", response.content);
        }
        Ok(response.content)
    }

    /// Grade a free-text (or composite vocabulary) answer against the rubric.
    #[instrument(skip(self, question, answer), fields(qid = %question.qid))]
    pub async fn grade(
        &self,
        question: &Question,
        answer: &str,
    ) -> Result<GradingResult, GradingError> {
        let rubric = serde_json::to_string(&question.answers)
            .map_err(|e| GradingError::MalformedVerdict(format!("rubric serialization: {e}")))?;
        let prompt = format!(
            "題目內容：{}\n題目類型：{}\n官方評分準則：{}\n考生作答內容：\n\"\"\"\n{}\n\"\"\"",
            question.full_text(),
            question.kind,
            rubric,
            answer
        );

        let raw = self.ask(GRADING_INSTRUCTION, prompt, true).await?;
        parse_verdict(&raw, question)
    }

    /// A short nudge for the question. Never fails.
    #[instrument(skip(self, question), fields(qid = %question.qid))]
    pub async fn hint(&self, question: &Question) -> String {
        let rubric = serde_json::to_string(&question.answers).unwrap_or_default();
        let prompt = format!("題目：{}\n評分準則：{}", question.full_text(), rubric);
        self.advise(HINT_INSTRUCTION, prompt, HINT_EMPTY, HINT_UNAVAILABLE)
            .await
    }

    /// A guided answer outline with no answers in it. Never fails.
    #[instrument(skip(self, question), fields(qid = %question.qid))]
    pub async fn framework(&self, question: &Question) -> String {
        let prompt = format!(
            "題目：{}\n請僅提供此題的引導式答題框架。",
            question.full_text()
        );
        self.advise(FRAMEWORK_INSTRUCTION, prompt, FRAMEWORK_EMPTY, FRAMEWORK_UNAVAILABLE)
            .await
    }

    /// Longitudinal report over the full attempt histories of `questions`.
    /// Never fails.
    #[instrument(skip_all, fields(questions = questions.len()))]
    pub async fn analyze_weaknesses(&self, questions: &[Question], progress: &ProgressMap) -> String {
        let history: Vec<WeaknessEntry<'_>> = questions
            .iter()
            .map(|q| WeaknessEntry::new(q, progress))
            .collect();
        let payload = serde_json::to_string(&history).unwrap_or_default();
        let prompt = format!(
            "以下是學生的完整錯題與嘗試歷史數據：\n{payload}\n\n請根據這些數據進行深度弱點診斷。"
        );
        self.advise(ANALYSIS_INSTRUCTION, prompt, ANALYSIS_EMPTY, ANALYSIS_UNAVAILABLE)
            .await
    }

    async fn advise(
        &self,
        system_prompt: &str,
        prompt: String,
        empty: &str,
        unavailable: &str,
    ) -> String {
        match self.ask(system_prompt, prompt, false).await {
            Ok(content) => {
                let trimmed = content.trim();
                if trimmed.is_empty() {
                    empty.to_string()
                } else {
                    trimmed.to_string()
                }
            }
            Err(e) => {
                warn!("advisory oracle call failed: {e}");
                unavailable.to_string()
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WeaknessEntry<'a> {
    title: String,
    #[serde(rename = "type")]
    kind: String,
    attempts: Vec<AttemptEntry<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttemptEntry<'a> {
    attempt_number: usize,
    answer: &'a str,
    score: String,
    comment: &'a str,
}

impl<'a> WeaknessEntry<'a> {
    fn new(question: &'a Question, progress: &'a ProgressMap) -> Self {
        let attempts = progress
            .get(&question.qid)
            .map(|history| {
                history
                    .iter()
                    .enumerate()
                    .map(|(i, a)| AttemptEntry {
                        attempt_number: i + 1,
                        answer: &a.answer,
                        score: format!("{}/{}", a.result.total_score, a.result.max_score),
                        comment: &a.result.overall_comment,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            title: question.excerpt(50),
            kind: question.kind.to_string(),
            attempts,
        }
    }
}

/// Undo the full-width quotation substitution some models make, where the
/// opening quote of a string value comes back as `「`.
pub fn repair_verdict_json(raw: &str) -> String {
    raw.replace(":「", ":\"")
}

/// Repair, parse and validate a raw verdict for `question`.
///
/// Bounds are checked rather than clamped: a verdict that violates them is
/// rejected as a whole.
pub fn parse_verdict(raw: &str, question: &Question) -> Result<GradingResult, GradingError> {
    let repaired = repair_verdict_json(raw.trim());
    let result: GradingResult = serde_json::from_str(&repaired)
        .map_err(|e| GradingError::MalformedVerdict(e.to_string()))?;
    validate_verdict(&result, question)?;
    debug!(
        total = result.total_score,
        max = result.max_score,
        points = result.feedback.len(),
        "verdict accepted"
    );
    Ok(result)
}

fn validate_verdict(result: &GradingResult, question: &Question) -> Result<(), GradingError> {
    let out_of_bounds = |msg: String| Err(GradingError::VerdictOutOfBounds(msg));

    if (result.max_score - question.score).abs() > 1e-9 {
        return out_of_bounds(format!(
            "maxScore {} does not match the question's {}",
            result.max_score, question.score
        ));
    }
    if !(0.0..=result.max_score).contains(&result.total_score) {
        return out_of_bounds(format!(
            "totalScore {} outside 0..={}",
            result.total_score, result.max_score
        ));
    }
    for item in &result.feedback {
        if item.point_index >= question.answers.len() {
            return out_of_bounds(format!(
                "pointIndex {} but the rubric has {} entries",
                item.point_index,
                question.answers.len()
            ));
        }
        if !(0.0..=result.max_score).contains(&item.awarded_score) {
            return out_of_bounds(format!(
                "awardedScore {} for point {} outside 0..={}",
                item.awarded_score, item.point_index, result.max_score
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::model::{GradingResult, SavedResult};
    use crate::testing::{analysis_question, verdict, ScriptedProvider};
    use std::io;
    use std::sync::Mutex;

    fn oracle(provider: Arc<ScriptedProvider>) -> RubricOracle {
        RubricOracle::new(provider, OracleSettings::default())
    }

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Grade once with the given echo setting and return what was logged.
    async fn grade_with_echo(debug_echo: bool) -> String {
        let log = CapturedLog::default();
        let sink = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let provider = Arc::new(ScriptedProvider::replying(&verdict(3.0, 4.0)));
        let settings = OracleSettings {
            debug_echo,
            ..OracleSettings::default()
        };
        RubricOracle::new(provider, settings)
            .grade(&analysis_question(), "詩人借景抒情")
            .await
            .unwrap();
        log.contents()
    }

    #[tokio::test]
    async fn debug_echo_mirrors_raw_reply() {
        let logged = grade_with_echo(true).await;
        assert!(logged.contains(ECHO_TARGET), "log was: {logged}");
        assert!(logged.contains("\"totalScore\":3"), "log was: {logged}");
    }

    #[tokio::test]
    async fn echo_is_silent_by_default() {
        let logged = grade_with_echo(false).await;
        assert!(!logged.contains(ECHO_TARGET), "log was: {logged}");
        assert!(!logged.contains("totalScore"), "log was: {logged}");
    }

    #[tokio::test]
    async fn grade_parses_valid_verdict() {
        let provider = Arc::new(ScriptedProvider::replying(
            r#"{"totalScore": 2, "maxScore": 4, "feedback": [
                {"pointIndex": 0, "awardedScore": 2, "hit": true, "comment": "準確"},
                {"pointIndex": 1, "awardedScore": 0, "hit": false, "comment": "未提及"}
            ], "overallComment": "尚可"}"#,
        ));
        let q = analysis_question();
        let result = oracle(provider.clone()).grade(&q, "詩人寄情山水").await.unwrap();
        assert_eq!(result.total_score, 2.0);
        assert_eq!(result.feedback.len(), 2);

        let request = provider.last_request().unwrap();
        assert!(request.json_response);
        assert!(request.prompt.contains("詩人寄情山水"));
        assert!(request.prompt.contains("analysis"));
        assert!(request.prompt.contains("\"label\":\"point\""));
        assert_eq!(request.model, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn grade_repairs_full_width_quote() {
        let provider = Arc::new(ScriptedProvider::replying(
            r#"{"totalScore":0,"maxScore":4,"feedback":[],"overallComment":「請認真作答"}"#,
        ));
        let result = oracle(provider)
            .grade(&analysis_question(), "asdfg")
            .await
            .unwrap();
        assert_eq!(result.total_score, 0.0);
        assert!(result.feedback.is_empty());
        assert_eq!(result.overall_comment, "請認真作答");
    }

    #[tokio::test]
    async fn grade_rejects_unparseable_reply() {
        let provider = Arc::new(ScriptedProvider::replying("I think the answer is fine."));
        let err = oracle(provider)
            .grade(&analysis_question(), "答案")
            .await
            .unwrap_err();
        assert!(matches!(err, GradingError::MalformedVerdict(_)));
    }

    #[tokio::test]
    async fn grade_rejects_total_above_max() {
        let provider = Arc::new(ScriptedProvider::replying(
            r#"{"totalScore": 5, "maxScore": 4, "feedback": [], "overallComment": ""}"#,
        ));
        let err = oracle(provider)
            .grade(&analysis_question(), "答案")
            .await
            .unwrap_err();
        assert!(matches!(err, GradingError::VerdictOutOfBounds(_)));
    }

    #[tokio::test]
    async fn grade_propagates_provider_error() {
        let provider = Arc::new(ScriptedProvider::failing(|| {
            ProviderError::InvalidModel("nope is not a valid model ID".into())
        }));
        let err = oracle(provider)
            .grade(&analysis_question(), "答案")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GradingError::Provider(ProviderError::InvalidModel(_))
        ));
    }

    #[test]
    fn verdict_rejects_bad_point_index() {
        let raw = r#"{"totalScore": 1, "maxScore": 4, "feedback": [
            {"pointIndex": 7, "awardedScore": 1, "hit": true, "comment": "?"}
        ], "overallComment": ""}"#;
        let err = parse_verdict(raw, &analysis_question()).unwrap_err();
        assert!(err.to_string().contains("pointIndex 7"));
    }

    #[test]
    fn verdict_rejects_mismatched_max() {
        let raw = r#"{"totalScore": 1, "maxScore": 10, "feedback": [], "overallComment": ""}"#;
        assert!(parse_verdict(raw, &analysis_question()).is_err());
    }

    #[tokio::test]
    async fn hint_is_trimmed() {
        let provider = Arc::new(ScriptedProvider::replying("  留意詩中的季節。 \n"));
        let hint = oracle(provider.clone()).hint(&analysis_question()).await;
        assert_eq!(hint, "留意詩中的季節。");
        assert!(!provider.last_request().unwrap().json_response);
    }

    #[tokio::test]
    async fn advisory_calls_degrade() {
        let provider = Arc::new(ScriptedProvider::failing(|| {
            ProviderError::NetworkError("down".into())
        }));
        let o = oracle(provider);
        let q = analysis_question();
        assert_eq!(o.hint(&q).await, HINT_UNAVAILABLE);
        assert_eq!(o.framework(&q).await, FRAMEWORK_UNAVAILABLE);
        assert_eq!(
            o.analyze_weaknesses(&[q], &ProgressMap::new()).await,
            ANALYSIS_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn empty_advice_uses_placeholder() {
        let provider = Arc::new(ScriptedProvider::replying("   "));
        assert_eq!(oracle(provider).framework(&analysis_question()).await, FRAMEWORK_EMPTY);
    }

    #[tokio::test]
    async fn weakness_payload_lists_every_attempt() {
        let provider = Arc::new(ScriptedProvider::replying("### 弱點"));
        let q = analysis_question();
        let mut progress = ProgressMap::new();
        let attempt = |answer: &str, total: f64, ts: i64| SavedResult {
            answer: answer.into(),
            result: GradingResult {
                total_score: total,
                max_score: 4.0,
                feedback: vec![],
                overall_comment: "再想想".into(),
            },
            timestamp: ts,
        };
        progress.insert(
            q.qid.clone(),
            vec![attempt("第一次", 1.0, 1), attempt("第二次", 3.0, 2)],
        );

        let report = oracle(provider.clone())
            .analyze_weaknesses(&[q], &progress)
            .await;
        assert_eq!(report, "### 弱點");

        let prompt = provider.last_request().unwrap().prompt;
        assert!(prompt.contains("\"attemptNumber\":2"));
        assert!(prompt.contains("\"score\":\"3/4\""));
        assert!(prompt.contains("第一次"));
    }
}

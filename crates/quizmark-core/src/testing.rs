//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::model::{AnswerLabel, AnswerPoint, Question, QuestionType, Requirement, RequirementKind, Segment};
use crate::traits::{ChatRequest, ChatResponse, LlmProvider};

enum Reply {
    Text(String),
    Fail(fn() -> ProviderError),
}

/// Provider that replays canned replies. The last reply repeats once the
/// queue runs dry.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    fn from_replies(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(content: &str) -> Self {
        Self::from_replies(vec![Reply::Text(content.to_string())])
    }

    pub fn sequence(contents: &[&str]) -> Self {
        Self::from_replies(contents.iter().map(|c| Reply::Text(c.to_string())).collect())
    }

    pub fn failing(make: fn() -> ProviderError) -> Self {
        Self::from_replies(vec![Reply::Fail(make)])
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = next {
            *last = Some(reply);
        }
        match last.as_ref() {
            Some(Reply::Text(content)) => Ok(ChatResponse {
                content: content.clone(),
                model: request.model.clone(),
                latency_ms: 1,
            }),
            Some(Reply::Fail(make)) => Err(make()),
            None => Err(ProviderError::NetworkError("no scripted reply".into())),
        }
    }
}

fn knowledge(topic: &str) -> Vec<Requirement> {
    vec![Requirement {
        kind: RequirementKind::Knowledge,
        topic: Some(topic.into()),
        qid: None,
    }]
}

/// Four-mark analysis question with two rubric points.
pub fn analysis_question() -> Question {
    Question {
        qid: "SJQM-A1".into(),
        requires: knowledge("山居秋暝"),
        segments: vec![Segment::new("試分析詩人在詩中流露的心境。")],
        score: 4.0,
        kind: QuestionType::Analysis,
        answers: vec![
            AnswerPoint {
                text: "寄情山水".into(),
                label: AnswerLabel::Point,
                remark: None,
                score: 2.0,
            },
            AnswerPoint {
                text: "歸隱之志".into(),
                label: AnswerLabel::Point,
                remark: None,
                score: 2.0,
            },
        ],
    }
}

/// Two-mark multiple choice question whose answer is `C`.
pub fn mc_question() -> Question {
    Question {
        qid: "Q1".into(),
        requires: knowledge("山居秋暝"),
        segments: vec![
            Segment::new("下列哪一項最能概括全詩主旨？"),
            Segment::new("A. 懷念故鄉\nB. 感慨時局\nC. 歸隱田園\nD. 送別友人"),
        ],
        score: 2.0,
        kind: QuestionType::Mc,
        answers: vec![
            AnswerPoint {
                text: "C".into(),
                label: AnswerLabel::Exact,
                remark: None,
                score: 2.0,
            },
            AnswerPoint {
                text: "末句「王孫自可留」表明詩人願意留在山中。".into(),
                label: AnswerLabel::Point,
                remark: None,
                score: 0.0,
            },
        ],
    }
}

/// Vocabulary question with two blanks.
pub fn vocabulary_question() -> Question {
    Question {
        qid: "V1".into(),
        requires: knowledge("山居秋暝"),
        segments: vec![
            Segment::new("解釋下列文句中的粗體字："),
            Segment::with_reference("竹喧歸**浣**女", vec![0]),
            Segment::with_reference("王孫自可**留**", vec![1]),
        ],
        score: 2.0,
        kind: QuestionType::Vocabulary,
        answers: vec![
            AnswerPoint {
                text: "洗衣".into(),
                label: AnswerLabel::Point,
                remark: None,
                score: 1.0,
            },
            AnswerPoint {
                text: "留下".into(),
                label: AnswerLabel::Point,
                remark: None,
                score: 1.0,
            },
        ],
    }
}

/// A verdict JSON string for a question of the given full marks.
pub fn verdict(total: f64, max: f64) -> String {
    serde_json::json!({
        "totalScore": total,
        "maxScore": max,
        "feedback": [{"pointIndex": 0, "awardedScore": total, "hit": total > 0.0, "comment": "評語"}],
        "overallComment": "整體評語"
    })
    .to_string()
}

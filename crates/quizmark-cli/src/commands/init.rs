//! The `quizmark init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("quizmark.toml"), SAMPLE_CONFIG)?;
    write_if_missing(Path::new("demo-data/data/shanjuqiuming.json"), DEMO_QUESTIONS)?;
    write_if_missing(
        Path::new("demo-data/data/source/shanjuqiuming.json"),
        DEMO_ORIGINAL,
    )?;

    println!("\nNext steps:");
    println!("  1. Put your OpenRouter key in quizmark.toml or export QUIZMARK_API_KEY");
    println!("  2. Run: quizmark validate --questions demo-data/data");
    println!("  3. Run: quizmark quiz --topic 山居秋暝");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizmark configuration

data_dir = "quizmark-data"
pass_ratio = 0.8

[oracle]
api_key = "${OPENROUTER_API_KEY}"
model = "xiaomi/mimo-v2-flash:free"
debug_echo = false
timeout_secs = 120

[content]
# Remove local_dir to fetch the full catalog from the content site.
local_dir = "demo-data"

[[content.topics]]
name = "山居秋暝"
slug = "shanjuqiuming"
"#;

const DEMO_QUESTIONS: &str = r#"[
  {
    "QID": "SJQM-DEMO-01",
    "requires": [{"type": "knowledge", "topic": "山居秋暝"}],
    "question": [
      {"text": "下列哪一項最能概括全詩主旨？"},
      {"text": "A. 懷念故鄉\nB. 感慨時局\nC. 歸隱田園\nD. 送別友人"}
    ],
    "score": 2,
    "type": "mc",
    "answer": [
      {"text": "C", "label": "exact", "score": 2},
      {"text": "末句「王孫自可留」表明詩人願意留在山中，流露歸隱之意。", "label": "point", "score": 0}
    ]
  },
  {
    "QID": "SJQM-DEMO-02",
    "requires": [{"type": "knowledge", "topic": "山居秋暝"}],
    "question": [
      {"text": "解釋下列文句中的粗體字："},
      {"text": "竹喧歸**浣**女", "score-reference": [0]},
      {"text": "王孫自可**留**", "score-reference": [1]}
    ],
    "score": 2,
    "type": "vocabulary",
    "answer": [
      {"text": "洗衣", "label": "point", "score": 1},
      {"text": "留下", "label": "point", "score": 1}
    ]
  },
  {
    "QID": "SJQM-DEMO-03",
    "requires": [{"type": "knowledge", "topic": "山居秋暝"}],
    "question": [
      {"text": "試分析詩人在頸聯中如何借景抒情。"}
    ],
    "score": 4,
    "type": "analysis",
    "answer": [
      {"text": "竹林喧鬧、蓮葉搖動，寫浣女漁舟歸來的生活情景", "label": "point", "score": 2},
      {"text": "流露詩人對山居純樸生活的喜愛", "label": "point", "score": 2}
    ]
  }
]
"#;

const DEMO_ORIGINAL: &str = r#"{
  "title": "山居秋暝",
  "author": "王維",
  "content": [
    {
      "source": "空山新雨後，天氣晚來秋。",
      "translation": {
        "word": ["空山：空寂的山", "暝：日落，天色將晚"],
        "sentence": "空寂的山中剛下過一場雨，傍晚的天氣帶着秋意。"
      }
    },
    {
      "source": "明月松間照，清泉石上流。",
      "translation": {
        "word": [],
        "sentence": "明月在松林間照耀，清澈的泉水在石上流淌。"
      }
    }
  ]
}
"#;

//! Quiz mode: static question catalog with pre-baked prompt audio, and
//! spoken-answer evaluation via transcription + a structured LLM
//! judgment.

use avatar_core::{
    AvatarError, FacialExpression, LipsyncData, Question, QuizEvaluateResponse, QuizQuestion,
    Result,
};
use avatar_llm::ChatModel;
use avatar_media::{read_file_base64, Transcriber, Workspace, WorkflowContext};
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Judging policy: semantic equivalence to the reference answer, not
/// exact match. Case differences, minor transcription misspellings, and
/// terse answers are all acceptable when the meaning matches.
const EVAL_SYSTEM_PROMPT: &str = "\
Te egy kvíz értékelő asszisztens vagy. A felhasználó szóban válaszolt egy kérdésre,
a válaszát beszédfelismerő írta le. Döntsd el, hogy a válasz jelentése megegyezik-e
a helyes válasszal. Rövid válasz is elfogadható, ha a jelentése stimmel.
A kis- és nagybetű különbségeket és az apró elírásokat hagyd figyelmen kívül.
A megfogalmazás hossza nem számít, csak a jelentés.
Adj egy rövid magyarázatot is, hogy miért helyes vagy helytelen a válasz.

Válaszolj PONTOSAN ebben a JSON formátumban:
{\"correct\": true/false, \"explanation\": \"rövid magyarázat\"}";

pub struct QuizService {
    workspace: Workspace,
    transcriber: Transcriber,
    model: Arc<dyn ChatModel>,
    catalog_path: PathBuf,
    assets_dir: PathBuf,
    catalog: OnceCell<Vec<Question>>,
}

impl QuizService {
    pub fn new(
        workspace: Workspace,
        transcriber: Transcriber,
        model: Arc<dyn ChatModel>,
        catalog_path: impl Into<PathBuf>,
        assets_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            workspace,
            transcriber,
            model,
            catalog_path: catalog_path.into(),
            assets_dir: assets_dir.into(),
            catalog: OnceCell::new(),
        }
    }

    /// The static catalog, read once per process and cached. Concurrent
    /// first loads are collapsed by the once-cell.
    async fn catalog(&self) -> Result<&[Question]> {
        let questions = self
            .catalog
            .get_or_try_init(|| async {
                let raw = tokio::fs::read_to_string(&self.catalog_path).await?;
                serde_json::from_str::<Vec<Question>>(&raw).map_err(|e| {
                    AvatarError::Catalog(format!("unparseable question catalog: {}", e))
                })
            })
            .await?;
        Ok(questions)
    }

    /// `n` random catalog entries with their pre-baked assets attached.
    pub async fn random_questions(&self, n: usize) -> Result<Vec<QuizQuestion>> {
        let mut selected = self.catalog().await?.to_vec();
        selected.shuffle(&mut rand::thread_rng());
        selected.truncate(n);
        self.attach_assets(selected).await
    }

    /// Deterministic variant: the first `n` catalog entries, in order.
    pub async fn first_questions(&self, n: usize) -> Result<Vec<QuizQuestion>> {
        let selected: Vec<Question> = self.catalog().await?.iter().take(n).cloned().collect();
        self.attach_assets(selected).await
    }

    async fn attach_assets(&self, selected: Vec<Question>) -> Result<Vec<QuizQuestion>> {
        let mut out = Vec::with_capacity(selected.len());
        for (index, question) in selected.into_iter().enumerate() {
            out.push(self.load_question_audio(question, index).await?);
        }
        Ok(out)
    }

    /// A missing or unparseable pre-generated asset is a catalog/build
    /// inconsistency: fatal for that entry, never degraded.
    async fn load_question_audio(&self, question: Question, index: usize) -> Result<QuizQuestion> {
        let mp3_path = self.assets_dir.join(format!("{}.mp3", question.id));
        let json_path = self.assets_dir.join(format!("{}.json", question.id));

        let audio = read_file_base64(&mp3_path).await.map_err(|_| {
            AvatarError::Catalog(format!(
                "Missing pre-generated audio for question {}",
                question.id
            ))
        })?;
        let lipsync_raw = tokio::fs::read_to_string(&json_path).await.map_err(|_| {
            AvatarError::Catalog(format!(
                "Missing pre-generated lipsync for question {}",
                question.id
            ))
        })?;
        let lipsync: LipsyncData = serde_json::from_str(&lipsync_raw).map_err(|e| {
            AvatarError::Catalog(format!(
                "Unparseable lipsync for question {}: {}",
                question.id, e
            ))
        })?;

        Ok(QuizQuestion {
            index,
            text: question.question,
            answer: question.answer,
            english_translation: question.english_translation,
            audio,
            lipsync,
            facial_expression: FacialExpression::Default,
        })
    }

    /// Transcribe a spoken answer and judge it against the reference.
    ///
    /// A malformed structured verdict degrades to a conservative
    /// "incorrect" with the transcript preserved; a transcription
    /// failure is still fatal.
    pub async fn evaluate(
        &self,
        ctx: &WorkflowContext,
        audio_path: &Path,
        question_text: &str,
        reference_answer: &str,
    ) -> Result<QuizEvaluateResponse> {
        let user_transcript = self
            .transcriber
            .transcribe(&self.workspace, ctx, audio_path)
            .await?;
        tracing::info!("Quiz STT: \"{}\"", user_transcript);

        let user_prompt = format!(
            "Kérdés: {}\nHelyes válasz: {}\nA tanuló válasza: {}",
            question_text, reference_answer, user_transcript
        );

        match self.model.judge(EVAL_SYSTEM_PROMPT, &user_prompt).await {
            Ok(verdict) => Ok(QuizEvaluateResponse {
                correct: verdict.correct,
                explanation: verdict.explanation,
                user_transcript,
            }),
            Err(e) => {
                tracing::warn!("Quiz evaluation degraded: {}", e);
                Ok(QuizEvaluateResponse {
                    correct: false,
                    explanation: String::new(),
                    user_transcript,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatar_core::config::{PathsConfig, SttConfig};
    use avatar_media::exec::{CommandRunner, RunOutput, ScriptedRunner};
    use avatar_media::Bucket;
    use avatar_llm::MockChat;
    use tempfile::TempDir;

    const CATALOG: &str = r#"[
        {"id": "q1", "question": "Mit szeretsz csinálni?", "answer": "Focizni", "englishTranslation": "To play football"},
        {"id": "q2", "question": "Milyen színű az ég?", "answer": "Kék", "englishTranslation": "Blue"},
        {"id": "q3", "question": "Hány lába van a macskának?", "answer": "Négy", "englishTranslation": "Four"}
    ]"#;

    fn transcribing_runner(transcript: &'static str) -> Arc<dyn CommandRunner> {
        Arc::new(ScriptedRunner::new(move |program, args| {
            if program.ends_with("ffmpeg") {
                std::fs::write(args.last().unwrap(), b"wav")?;
            } else {
                let wav = PathBuf::from(&args[0]);
                std::fs::write(wav.with_extension("txt"), transcript)?;
            }
            Ok(RunOutput::ok())
        }))
    }

    struct Fixture {
        _guard: TempDir,
        service: QuizService,
        workspace: Workspace,
    }

    fn fixture(transcript: &'static str, llm_reply: &str, with_assets: bool) -> Fixture {
        let guard = TempDir::new().unwrap();
        let root = guard.path();
        let catalog_path = root.join("questions.json");
        std::fs::write(&catalog_path, CATALOG).unwrap();

        let assets_dir = root.join("questions_audio");
        std::fs::create_dir_all(&assets_dir).unwrap();
        if with_assets {
            for id in ["q1", "q2", "q3"] {
                std::fs::write(assets_dir.join(format!("{}.mp3", id)), b"ID3mp3").unwrap();
                std::fs::write(
                    assets_dir.join(format!("{}.json", id)),
                    r#"{"mouthCues":[{"start":0.0,"end":0.3,"value":"X"}]}"#,
                )
                .unwrap();
            }
        }

        let workspace = Workspace::new(root.join("temp"));
        let transcriber = Transcriber::new(
            transcribing_runner(transcript),
            &SttConfig::default(),
            &PathsConfig::default(),
        );
        let service = QuizService::new(
            workspace.clone(),
            transcriber,
            Arc::new(MockChat::with_reply(llm_reply)),
            catalog_path,
            assets_dir,
        );
        Fixture {
            _guard: guard,
            service,
            workspace,
        }
    }

    async fn stage_answer(f: &Fixture, ctx: &WorkflowContext) -> PathBuf {
        f.workspace
            .file_under(ctx, Bucket::Input, "original.webm", Some(b"spoken"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_questions_are_indexed_in_order() {
        let f = fixture("", "{}", true);
        let questions = f.service.first_questions(3).await.unwrap();
        assert_eq!(questions.len(), 3);
        for (i, q) in questions.iter().enumerate() {
            assert_eq!(q.index, i);
            assert!(!q.audio.is_empty());
            assert_eq!(q.lipsync.mouth_cues.len(), 1);
            assert_eq!(q.facial_expression, FacialExpression::Default);
        }
        assert_eq!(questions[0].text, "Mit szeretsz csinálni?");
        assert_eq!(questions[0].answer, "Focizni");
    }

    #[tokio::test]
    async fn test_random_questions_returns_n_distinct() {
        let f = fixture("", "{}", true);
        let questions = f.service.random_questions(2).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_ne!(questions[0].text, questions[1].text);
        assert_eq!(questions[0].index, 0);
        assert_eq!(questions[1].index, 1);
    }

    #[tokio::test]
    async fn test_missing_asset_is_fatal() {
        let f = fixture("", "{}", false);
        let err = f.service.first_questions(1).await.unwrap_err();
        assert!(matches!(err, AvatarError::Catalog(_)));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_catalog_is_cached_after_first_read() {
        let f = fixture("", "{}", true);
        f.service.first_questions(1).await.unwrap();
        // Corrupt the file; the cache must still serve the old catalog.
        std::fs::write(&f.service.catalog_path, "garbage").unwrap();
        assert!(f.service.first_questions(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_evaluate_accepts_case_different_near_match() {
        // Reference "Focizni", transcript "focizni": the judge accepts.
        let f = fixture(
            "focizni",
            r#"{"correct": true, "explanation": "A jelentés megegyezik."}"#,
            true,
        );
        let ctx = WorkflowContext::new();
        let audio = stage_answer(&f, &ctx).await;
        let result = f
            .service
            .evaluate(&ctx, &audio, "Mit szeretsz csinálni?", "Focizni")
            .await
            .unwrap();
        assert!(result.correct);
        assert_eq!(result.user_transcript, "focizni");
        assert!(!result.explanation.is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_degrades_on_malformed_verdict() {
        let f = fixture("kék", "Hmm, I believe that is right.", true);
        let ctx = WorkflowContext::new();
        let audio = stage_answer(&f, &ctx).await;
        let result = f
            .service
            .evaluate(&ctx, &audio, "Milyen színű az ég?", "Kék")
            .await
            .unwrap();
        assert!(!result.correct);
        assert_eq!(result.explanation, "");
        assert_eq!(result.user_transcript, "kék");
    }

    #[tokio::test]
    async fn test_evaluate_transcription_failure_is_fatal() {
        let guard = TempDir::new().unwrap();
        let root = guard.path();
        std::fs::write(root.join("questions.json"), CATALOG).unwrap();
        let workspace = Workspace::new(root.join("temp"));
        let runner: Arc<dyn CommandRunner> =
            Arc::new(ScriptedRunner::new(|_, _| Ok(RunOutput::failed("no gpu"))));
        let service = QuizService::new(
            workspace.clone(),
            Transcriber::new(runner, &SttConfig::default(), &PathsConfig::default()),
            Arc::new(MockChat::default()),
            root.join("questions.json"),
            root.join("questions_audio"),
        );
        let ctx = WorkflowContext::new();
        let audio = workspace
            .file_under(&ctx, Bucket::Input, "original.webm", Some(b"x"))
            .await
            .unwrap();
        let err = service
            .evaluate(&ctx, &audio, "kérdés", "válasz")
            .await
            .unwrap_err();
        assert!(matches!(err, AvatarError::Transcription));
    }
}

//! Store plus generator, wired the way the agent uses them.

use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::{ Arc, Mutex };

use async_trait::async_trait;
use gemini_relay::history::{ HistoryStore, MemoryHistoryStore };
use gemini_relay::llm::chat::{
    ChatBackend,
    ChatRequest,
    ChatTurn,
    GenerationConfig,
    GenerationError,
    ResponseGenerator,
};
use gemini_relay::models::chat::{ NewConversation, NewMessage, Role };

struct StubGemini {
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

#[async_trait]
impl ChatBackend for StubGemini {
    async fn send_chat(
        &self,
        credential: &str,
        request: &ChatRequest
    ) -> Result<String, GenerationError> {
        assert_eq!(credential, "valid-key");
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        Ok("I'm well.".to_string())
    }

    fn get_model(&self) -> String {
        "stub-gemini".to_string()
    }
}

#[tokio::test]
async fn demo_conversation_round_trip() {
    let store = MemoryHistoryStore::new();

    let conv = store.create_conversation(NewConversation::titled("Demo")).await.unwrap();
    assert_eq!(conv.id, 1);
    assert_eq!(conv.title, "Demo");

    let hi = store.create_message(NewMessage::new(conv.id, Role::User, "Hi")).await.unwrap();
    assert_eq!(hi.id, 1);
    let hello = store
        .create_message(NewMessage::new(conv.id, Role::Assistant, "Hello!")).await
        .unwrap();
    assert_eq!(hello.id, 2);

    let history = store.get_messages_by_conversation(conv.id).await.unwrap();
    assert_eq!(history, vec![hi, hello]);

    let backend = Arc::new(StubGemini {
        calls: AtomicUsize::new(0),
        requests: Mutex::new(Vec::new()),
    });
    let generator = ResponseGenerator::new(
        backend.clone(),
        Some("valid-key".to_string()),
        GenerationConfig::default()
    );

    let reply = generator.generate("How are you?", &history).await.unwrap();
    assert_eq!(reply, "I'm well.");
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests[0].history, vec![ChatTurn::user("Hi"), ChatTurn::model("Hello!")]);
    assert_eq!(requests[0].prompt, "How are you?");
    assert_eq!(requests[0].config.temperature, 0.7);
    assert_eq!(requests[0].config.max_output_tokens, 2048);
}

#[tokio::test]
async fn unset_credential_never_reaches_the_service() {
    let backend = Arc::new(StubGemini {
        calls: AtomicUsize::new(0),
        requests: Mutex::new(Vec::new()),
    });
    let generator = ResponseGenerator::new(backend.clone(), None, GenerationConfig::default());

    let err = generator.generate("How are you?", &[]).await.unwrap_err();
    assert_eq!(err, GenerationError::MissingCredential);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

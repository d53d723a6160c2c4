use std::future::Future;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;
use uwv_chat_core::{BackendClient, Completion, Config, ConversationStore, Texts};

use crate::tui::AppEvent;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub store: ConversationStore,
    pub client: BackendClient,
    pub events: UnboundedSender<AppEvent>,
    pub render_markdown: bool,
    pub maintenance: bool,

    // Input state
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Chat view state
    pub chat_scroll: u16,
    pub max_chat_scroll: u16, // updated during render
    pub follow_bottom: bool,
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Model picker state
    pub show_model_picker: bool,
    pub model_picker_state: ListState,
}

impl App {
    pub fn new(config: &Config, client: BackendClient, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            store: ConversationStore::new(config.texts.clone()),
            client,
            events,
            render_markdown: config.render_markdown,
            maintenance: config.maintenance,

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            max_chat_scroll: 0,
            follow_bottom: true,
            chat_area: None,

            animation_frame: 0,

            show_model_picker: false,
            model_picker_state: ListState::default(),
        }
    }

    pub fn texts(&self) -> &Texts {
        self.store.texts()
    }

    /// Kick off the requests issued when the chat first opens.
    pub fn on_startup(&mut self) {
        self.start_conversation();
        self.refresh_models();
    }

    /// Run `request` on its own task and post its completion to the event loop.
    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            let completion = request.await;
            if events.send(AppEvent::Backend(completion)).is_err() {
                tracing::debug!("event loop gone, dropping backend completion");
            }
        });
    }

    pub fn start_conversation(&mut self) {
        if self.maintenance {
            return;
        }
        let ticket = self.store.begin_start();
        let client = self.client.clone();
        self.spawn_request(async move {
            Completion::Started {
                ticket,
                result: client.start_conversation().await,
            }
        });
        self.follow_bottom = true;
    }

    /// Send the current input. Blank input and sends while a reply is pending
    /// are ignored; in the latter case the input is kept.
    pub fn send_input(&mut self) {
        if self.maintenance {
            return;
        }
        let text = self.input.clone();
        let Some(ticket) = self.store.begin_send(&text) else {
            return;
        };
        self.input.clear();
        self.cursor = 0;
        self.follow_bottom = true;

        let client = self.client.clone();
        self.spawn_request(async move {
            Completion::Replied {
                ticket,
                result: client.send_message(&text).await,
            }
        });
    }

    pub fn refresh_models(&mut self) {
        if self.maintenance {
            return;
        }
        let client = self.client.clone();
        self.spawn_request(async move { Completion::Models(client.available_models().await) });
    }

    pub fn select_model(&mut self, model: String) {
        if self.maintenance {
            return;
        }
        let client = self.client.clone();
        self.spawn_request(async move {
            let result = client.select_model(&model).await;
            Completion::ModelSelected { model, result }
        });
    }

    pub fn clear_memory(&mut self) {
        if self.maintenance {
            return;
        }
        let ticket = self.store.begin_clear();
        let client = self.client.clone();
        self.spawn_request(async move {
            Completion::MemoryCleared {
                ticket,
                result: client.clear_memory().await,
            }
        });
    }

    pub fn on_completion(&mut self, completion: Completion) {
        if self.store.apply(completion) {
            self.follow_bottom = true;
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.store.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling
    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_chat_scroll);
        if self.chat_scroll >= self.max_chat_scroll {
            self.follow_bottom = true;
        }
    }

    pub fn page_size(&self) -> u16 {
        self.chat_area
            .map(|area| area.height.saturating_sub(2))
            .unwrap_or(10)
            .max(1)
    }

    // Model picker methods
    pub fn open_model_picker(&mut self) {
        if self.store.available_models().is_empty() {
            // Nothing to pick from yet; ask again in case the backend came up
            self.refresh_models();
            return;
        }
        let models = self.store.available_models();
        let current = self
            .store
            .selected_model()
            .and_then(|selected| models.iter().position(|m| m == selected))
            .unwrap_or(0);
        self.model_picker_state.select(Some(current));
        self.show_model_picker = true;
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = self.store.available_models().len();
        if len > 0 {
            let i = self.model_picker_state.selected().unwrap_or(0);
            self.model_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn pick_model(&mut self) {
        let picked = self
            .model_picker_state
            .selected()
            .and_then(|i| self.store.available_models().get(i))
            .cloned();
        self.show_model_picker = false;
        if let Some(model) = picked {
            self.select_model(model);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use uwv_chat_core::ChatMessage;

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(&Config::new(), BackendClient::new("http://127.0.0.1:9"), tx);
        (app, rx)
    }

    #[tokio::test]
    async fn send_input_appends_and_clears_input() {
        let (mut app, _rx) = test_app();
        app.input = "Hallo".to_string();
        app.cursor = 5;
        app.send_input();

        assert_eq!(app.store.messages(), &[ChatMessage::user("Hallo")]);
        assert!(app.store.is_pending());
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
    }

    #[tokio::test]
    async fn pending_send_keeps_input() {
        let (mut app, _rx) = test_app();
        app.input = "een".to_string();
        app.send_input();
        app.input = "twee".to_string();
        app.send_input();

        assert_eq!(app.store.len(), 1);
        assert_eq!(app.input, "twee");
    }

    #[tokio::test]
    async fn failed_request_comes_back_as_event() {
        let (mut app, mut rx) = test_app();
        app.input = "Hallo".to_string();
        app.send_input();

        match rx.recv().await {
            Some(AppEvent::Backend(completion)) => app.on_completion(completion),
            other => panic!("expected backend completion, got {:?}", other),
        }
        assert_eq!(app.store.len(), 2);
        assert_eq!(app.store.last().unwrap().content, app.texts().send_error);
        assert!(!app.store.is_pending());
    }

    #[tokio::test]
    async fn maintenance_mode_issues_no_requests() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let config = Config {
            maintenance: true,
            ..Config::new()
        };
        let mut app = App::new(&config, BackendClient::new("http://127.0.0.1:9"), tx);
        app.on_startup();
        app.input = "Hallo".to_string();
        app.send_input();

        assert!(app.store.is_empty());
        assert!(!app.store.is_pending());
        drop(app);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn model_picker_navigation() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(&Config::new(), BackendClient::new("http://127.0.0.1:9"), tx);
        app.store.set_models(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        app.store.set_selected_model("b");

        app.open_model_picker();
        assert!(app.show_model_picker);
        assert_eq!(app.model_picker_state.selected(), Some(1));

        app.model_picker_nav_down();
        app.model_picker_nav_down();
        assert_eq!(app.model_picker_state.selected(), Some(2));
        app.model_picker_nav_up();
        assert_eq!(app.model_picker_state.selected(), Some(1));
    }

    #[test]
    fn scrolling_up_stops_following() {
        let (mut app, _rx) = test_app();
        app.max_chat_scroll = 20;
        app.chat_scroll = 20;
        app.scroll_up(5);
        assert_eq!(app.chat_scroll, 15);
        assert!(!app.follow_bottom);
        app.scroll_down(50);
        assert_eq!(app.chat_scroll, 20);
        assert!(app.follow_bottom);
    }
}

use leptos::ev;
use leptos::prelude::*;

use crate::models::Role;
use crate::state::AppState;

/// Floating chat widget: launcher button plus the conversation panel.
#[component]
pub fn ChatWidget() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <div class="chat-widget" class:open=move || state.is_open.get()>
            <button
                class="chat-launcher"
                aria-label="Abrir chat"
                on:click=move |_| state.toggle_open()
            >
                {move || if state.is_open.get() { "×" } else { "💬" }}
            </button>
            <Show when=move || state.is_open.get()>
                <ChatPanel />
            </Show>
        </div>
    }
}

#[component]
fn ChatPanel() -> impl IntoView {
    let state = expect_context::<AppState>();

    view! {
        <section class="chat-panel" role="dialog" aria-label="Chat">
            <header class="chat-header">"Fale com a gente"</header>

            <div class="messages-container" aria-live="polite">
                // The typing indicator is not a message, so it never hides the empty state.
                {move || {
                    state.messages.with(Vec::is_empty).then(|| view! {
                        <div class="empty-state">"Envie uma mensagem para começar"</div>
                    })
                }}
                <For
                    each=move || state.messages.get()
                    key=|m| m.id.clone()
                    let:msg
                >
                    <MessageBubble role=msg.role content=msg.content.clone() />
                </For>
                <Show when=move || state.is_sending()>
                    <div class="message assistant typing-indicator" aria-label="Digitando">
                        <span></span><span></span><span></span>
                    </div>
                </Show>
            </div>

            <ChatInput />
        </section>
    }
}

/// A single chat message bubble.
#[component]
fn MessageBubble(role: Role, content: String) -> impl IntoView {
    let css_class = format!("message {}", role.as_str());

    view! {
        <div class=css_class>
            <div>{content}</div>
        </div>
    }
}

/// Chat input form with textarea and send button.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (input, set_input) = signal(String::new());

    let send = move || {
        let text = input.get_untracked().trim().to_string();
        if text.is_empty() {
            return;
        }
        // Rejected while a turn is in flight; the draft stays in the box.
        if state.send_message(text) {
            set_input.set(String::new());
        }
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            send();
        }
    };

    view! {
        <div class="input-area">
            <div class="input-row">
                <textarea
                    node_ref=state.input_ref
                    rows="1"
                    placeholder="Digite sua mensagem… (Enter envia, Shift+Enter quebra linha)"
                    prop:value=input
                    on:input=move |ev| {
                        set_input.set(event_target_value(&ev));
                    }
                    on:keydown=on_keydown
                    disabled=move || state.is_sending()
                />
                <button
                    class="send-btn"
                    on:click=move |_| send()
                    disabled=move || state.is_sending() || input.get().trim().is_empty()
                >
                    {move || if state.is_sending() { "Enviando…" } else { "Enviar" }}
                </button>
            </div>
        </div>
    }
}

use bat::WrappingMode;

use orderdesk::models::message::{Message, MessageContent};
use orderdesk::models::role::Role;

fn print_markdown(content: &str) {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()
        .unwrap_or_else(|e| {
            println!("{}", content);
            tracing::debug!("fallback render: {}", e);
            true
        });
}

fn print_panel(content: &str, title: &str, language: &str) {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()).name(title))
        .language(language)
        .grid(true)
        .header(true)
        .wrapping_mode(WrappingMode::Character)
        .print()
        .unwrap_or_else(|e| {
            println!("{}: {}", title, content);
            tracing::debug!("fallback render: {}", e);
            true
        });
}

/// Render one turn message. User messages are skipped since the
/// operator just typed them.
pub fn render(message: &Message) {
    if message.role == Role::User {
        return;
    }

    for content in &message.content {
        match content {
            MessageContent::Text(text) => print_markdown(&text.text),
            MessageContent::ToolRequest(request) => match &request.tool_call {
                Ok(call) => {
                    let arguments = serde_json::to_string_pretty(&call.arguments)
                        .unwrap_or_else(|_| call.arguments.to_string());
                    print_panel(&arguments, &format!("Tool Request: {}", call.name), "JSON");
                }
                Err(e) => print_markdown(&e.to_string()),
            },
            MessageContent::ToolResponse(response) => match &response.tool_result {
                Ok(result) => {
                    let language = if result.starts_with('{') || result.starts_with('[') {
                        "JSON"
                    } else {
                        "Markdown"
                    };
                    print_panel(
                        result,
                        &format!("Tool Response: {}", response.tool_name),
                        language,
                    );
                }
                Err(e) => print_panel(
                    &e.to_string(),
                    &format!("Tool Response: {}", response.tool_name),
                    "Markdown",
                ),
            },
        }
    }
}

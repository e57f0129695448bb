//! TwiML documents for outbound calls and inbound webhooks.

const VOICE_PATH: &str = "/twilio/voice";
const GATHER_PATH: &str = "/twilio/handle-gather";
const VOICE: &str = "Polly.Seoyeon";
const LANGUAGE: &str = "ko-KR";

const GREETING: &str =
    "안녕하세요. 재난 안전 시스템입니다. 신고하시려면 신고, 문의사항이 있으시면 문의 라고 말씀해주세요.";
const REPORT_ACK: &str = "신고 접수를 시작하겠습니다. 필요한 정보를 말씀해주세요.";
const INQUIRY_ACK: &str = "문의사항 접수를 위해 잠시 후 상담원을 연결해 드리겠습니다.";
const RETRY_PROMPT: &str = "죄송합니다, 이해하지 못했습니다. 다시 시도해주세요.";

/// Escape text for XML element content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn document(body: &str) -> String {
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>{body}</Response>")
}

fn say(text: &str) -> String {
    format!("<Say voice=\"{VOICE}\">{}</Say>", escape(text))
}

fn redirect_to_menu() -> String {
    format!("<Redirect>{VOICE_PATH}</Redirect>")
}

/// Call script for an outbound announcement.
pub fn call_announcement(message: &str) -> String {
    format!("<Response><Say language=\"{LANGUAGE}\">{}</Say></Response>", escape(message))
}

/// Reply to an inbound SMS.
pub fn sms_reply(body: &str) -> String {
    document(&format!(
        "<Message>{}</Message>",
        escape(&format!("응답: '{body}' 잘 받았어요!"))
    ))
}

/// Speech menu for an inbound call.
pub fn voice_menu() -> String {
    document(&format!(
        "<Gather input=\"speech\" action=\"{GATHER_PATH}\" method=\"POST\" language=\"{LANGUAGE}\" speechTimeout=\"auto\">{}</Gather>{}",
        say(GREETING),
        redirect_to_menu()
    ))
}

/// What the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceIntent {
    Report,
    Inquiry,
    Unrecognized,
}

impl VoiceIntent {
    /// `신고` wins over `문의` when both are spoken.
    pub fn classify(speech: &str) -> Self {
        let speech = speech.trim();
        if speech.contains("신고") {
            VoiceIntent::Report
        } else if speech.contains("문의") {
            VoiceIntent::Inquiry
        } else {
            VoiceIntent::Unrecognized
        }
    }

    /// Response to the gathered speech. Unrecognized input loops back to the
    /// menu with no retry limit.
    pub fn response(self) -> String {
        match self {
            VoiceIntent::Report => document(&format!("{}<Hangup/>", say(REPORT_ACK))),
            VoiceIntent::Inquiry => document(&format!("{}<Hangup/>", say(INQUIRY_ACK))),
            VoiceIntent::Unrecognized => {
                document(&format!("{}{}", say(RETRY_PROMPT), redirect_to_menu()))
            }
        }
    }
}

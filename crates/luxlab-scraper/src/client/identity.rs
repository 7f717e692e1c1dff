//! Browser identities rotated across requests.
//!
//! Only request headers change between identities.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: &'static str,
    pub accept_language: &'static str,
    pub platform: &'static str,
}

pub const DEFAULT_IDENTITIES: [Identity; 5] = [
    Identity {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        accept_language: "it-IT,it;q=0.9,en-US;q=0.8,en;q=0.7",
        platform: "\"Windows\"",
    },
    Identity {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        accept_language: "en-GB,en;q=0.9",
        platform: "\"macOS\"",
    },
    Identity {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        accept_language: "en-US,en;q=0.9",
        platform: "\"Linux\"",
    },
    Identity {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
        accept_language: "fr-FR,fr;q=0.9,en;q=0.6",
        platform: "\"Windows\"",
    },
    Identity {
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
        accept_language: "de-DE,de;q=0.9,en;q=0.7",
        platform: "\"iOS\"",
    },
];

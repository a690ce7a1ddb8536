use super::{compile_table, SCRIPT_TYPES};
use crate::rules::{Category, Rule};
use once_cell::sync::Lazy;

const MODERN: &[(&str, &str, &str)] = &[
    ("fetch", r"\bfetch\s*\(", "Fetch API"),
    ("intersection-observer", r"\bIntersectionObserver\b", "Intersection Observer"),
    ("resize-observer", r"\bResizeObserver\b", "Resize Observer"),
    ("mutation-observer", r"\bMutationObserver\b", "Mutation Observer"),
    ("web-animations", r"\.animate\s*\(\s*[\[{]", "Web Animations API"),
    ("clipboard-api", r"navigator\.clipboard\b", "Async Clipboard API"),
    ("service-worker", r"navigator\.serviceWorker\b", "Service Workers"),
    ("web-share", r"navigator\.share\s*\(", "Web Share API"),
    ("abort-controller", r"\bnew\s+AbortController\s*\(", "AbortController"),
    ("structured-clone", r"\bstructuredClone\s*\(", "structuredClone()"),
    ("broadcast-channel", r"\bnew\s+BroadcastChannel\s*\(", "Broadcast Channel"),
    ("web-locks", r"navigator\.locks\b", "Web Locks API"),
    ("payment-request", r"\bnew\s+PaymentRequest\s*\(", "Payment Request API"),
    ("web-components", r"customElements\.define\s*\(", "Custom Elements"),
    ("shadow-dom", r"\.attachShadow\s*\(", "Shadow DOM"),
    ("web-workers", r"\bnew\s+(?:Shared)?Worker\s*\(", "Web Workers"),
    ("websockets", r"\bnew\s+WebSocket\s*\(", "WebSockets"),
    ("view-transitions", r"\bstartViewTransition\s*\(", "View Transitions API"),
    ("navigation-api", r"\bnavigation\.(?:navigate|addEventListener)\s*\(", "Navigation API"),
    ("file-system-access", r"\bshow(?:Open|Save)FilePicker\s*\(|\bshowDirectoryPicker\s*\(", "File System Access API"),
    ("web-gpu", r"navigator\.gpu\b", "WebGPU"),
    ("compression-streams", r"\bnew\s+(?:De)?CompressionStream\s*\(", "Compression Streams"),
];

const LEGACY: &[(&str, &str, &str)] = &[
    ("xml-http-request", r"\bnew\s+XMLHttpRequest\s*\(", "XMLHttpRequest"),
    ("document-write", r"\bdocument\.write(?:ln)?\s*\(", "document.write()"),
    ("attach-event", r"\.attachEvent\s*\(", "Legacy IE event model"),
    ("application-cache", r"\bapplicationCache\b", "Application Cache"),
];

pub static MODERN_APIS: Lazy<Vec<Rule>> =
    Lazy::new(|| compile_table(MODERN, Category::Api, SCRIPT_TYPES, None));

pub static LEGACY_APIS: Lazy<Vec<Rule>> =
    Lazy::new(|| compile_table(LEGACY, Category::Api, SCRIPT_TYPES, None));

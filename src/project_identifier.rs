//! Best-effort project identification: given a documentation URL or a page
//! of fetched content, guess the project's name, kind, language, and
//! framework. A heuristic signal, not a validated fact — useful for
//! labeling a crawl, never load-bearing for crawl correctness.
//!
//! Patterns and scoring use `once_cell`-cached regexes, matching the rest
//! of this crate.

use once_cell::sync::Lazy;
use regex::Regex;

/// Coarse classification of an identified project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    Package,
    Framework,
    Program,
    Library,
    CliTool,
    WebApp,
    Api,
    Unknown,
}

/// Heuristic identification of a project, produced by [`identify_from_url`]
/// or [`identify_from_content`]. A best-effort signal, not a validated fact.
#[derive(Debug, Clone)]
pub struct ProjectIdentity {
    pub name: String,
    pub kind: ProjectKind,
    pub language: Option<String>,
    pub framework: Option<String>,
    pub confidence: f32,
}

const DOC_PATTERNS: &[&str] = &[
    "https://{package}.readthedocs.io/en/latest/",
    "https://{package}.readthedocs.io/en/stable/",
    "https://docs.{package}.org/",
    "https://{package}.org/docs/",
    "https://www.{package}.org/docs/",
    "https://github.com/{package}/{package}/blob/main/README.md",
];

const DOC_PLATFORMS: &[(&str, f32)] = &[
    ("readthedocs.org", 0.9),
    ("docs.python.org", 0.9),
    ("developer.mozilla.org", 0.8),
    ("docs.microsoft.com", 0.8),
    ("docs.oracle.com", 0.8),
    ("pkg.go.dev", 0.8),
    ("docs.rs", 0.8),
    ("hexdocs.pm", 0.8),
    ("rubydoc.info", 0.8),
    ("godoc.org", 0.8),
];

const LANGUAGE_PATTERNS: &[(&str, &[&str])] = &[
    ("python", &[r"\.py$", r"requirements\.txt$", r"setup\.py$", r"pyproject\.toml$"]),
    ("javascript", &[r"\.js$", r"package\.json$", r"node_modules"]),
    ("java", &[r"\.java$", r"pom\.xml$", r"build\.gradle$"]),
    ("ruby", &[r"\.rb$", r"Gemfile$"]),
    ("go", &[r"\.go$", r"go\.mod$"]),
    ("rust", &[r"\.rs$", r"Cargo\.toml$"]),
    ("php", &[r"\.php$", r"composer\.json$"]),
];

const FRAMEWORK_PATTERNS: &[(&str, &[&str])] = &[
    ("django", &[r"django", r"urls\.py$", r"wsgi\.py$"]),
    ("flask", &[r"flask", r"app\.py$"]),
    ("react", &[r"react", r"jsx$", r"tsx$"]),
    ("angular", &[r"angular", r"component\.ts$"]),
    ("vue", &[r"vue", r"vue-cli"]),
    ("spring", &[r"spring-boot", r"springframework"]),
    ("rails", &[r"rails", r"activerecord"]),
];

static DOC_URL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)([^/]+)\.readthedocs\.org",
        r"(?i)docs\.([^/]+)\.org",
        r"(?i)/([^/]+)/docs?/",
        r"(?i)/projects?/([^/]+)",
        r"(?i)/packages?/([^/]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

static NAME_FROM_CONTENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"<title>([^<]+)</title>",
        r"(?m)^# ([^\n]+)",
        r"== ([^=]+) ==",
        r#"project["']\s*:\s*["']([^"']+)"#,
        r#"name["']\s*:\s*["']([^"']+)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern"))
    .collect()
});

static SUFFIX_TRIM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(-|\u{2013}|\u{2014})\s*(documentation|docs|manual|guide)$").expect("static pattern"));

/// Attempt to find a documentation URL for `package_name` by checking known
/// patterns against the given HTTP client. Returns the first pattern that
/// responds with a successful status. Package-registry metadata lookup is
/// out of scope here; this is pattern probing only.
pub async fn discover_doc_url(client: &reqwest::Client, package_name: &str) -> Option<String> {
    let package = package_name.to_lowercase();
    for pattern in DOC_PATTERNS {
        let url = pattern.replace("{package}", &package);
        let Ok(response) = client.head(&url).send().await else {
            continue;
        };
        if response.status().is_success() {
            return Some(url);
        }
    }
    None
}

/// Identify a project from a documentation URL alone.
#[must_use]
pub fn identify_from_url(url: &str) -> ProjectIdentity {
    let mut confidence = 0.0f32;
    let mut kind = ProjectKind::Unknown;
    let mut language = None;
    let mut framework = None;

    for (platform, conf) in DOC_PLATFORMS {
        if url.contains(platform) {
            confidence = confidence.max(*conf);
            break;
        }
    }

    let name = extract_name_from_url(url);

    for (lang, patterns) in LANGUAGE_PATTERNS {
        if patterns.iter().any(|p| Regex::new(&format!("(?i){p}")).is_ok_and(|re| re.is_match(url))) {
            language = Some((*lang).to_string());
            confidence = confidence.max(0.7);
            break;
        }
    }

    for (fw, patterns) in FRAMEWORK_PATTERNS {
        if patterns.iter().any(|p| Regex::new(&format!("(?i){p}")).is_ok_and(|re| re.is_match(url))) {
            framework = Some((*fw).to_string());
            kind = ProjectKind::Framework;
            confidence = confidence.max(0.8);
            break;
        }
    }

    ProjectIdentity { name, kind, language, framework, confidence }
}

/// Identify a project from fetched page content by keyword scoring.
#[must_use]
pub fn identify_from_content(content: &str) -> ProjectIdentity {
    const TYPE_KEYWORDS: &[(ProjectKind, &[&str])] = &[
        (ProjectKind::Package, &["import", "require", "dependency", "module"]),
        (ProjectKind::Framework, &["framework", "middleware", "plugin", "extension"]),
        (ProjectKind::Program, &["executable", "binary", "command-line", "CLI"]),
        (ProjectKind::Library, &["library", "SDK", "toolkit", "API"]),
        (ProjectKind::CliTool, &["command", "terminal", "shell", "console"]),
        (ProjectKind::WebApp, &["webapp", "website", "frontend", "backend"]),
        (ProjectKind::Api, &["API", "REST", "GraphQL", "endpoint"]),
    ];

    let mut scores: Vec<(ProjectKind, usize)> = TYPE_KEYWORDS
        .iter()
        .map(|(kind, keywords)| {
            let score = keywords
                .iter()
                .filter(|kw| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(kw))).is_ok_and(|re| re.is_match(content)))
                .count();
            (*kind, score)
        })
        .collect();

    scores.sort_by_key(|(_, score)| std::cmp::Reverse(*score));
    let (best_kind, best_score) = scores.first().copied().unwrap_or((ProjectKind::Unknown, 0));
    let kind = if best_score == 0 { ProjectKind::Unknown } else { best_kind };

    let total: usize = scores.iter().map(|(_, s)| s).sum();
    let confidence = if total > 0 { best_score as f32 / (total as f32 + 1.0) } else { 0.0 };

    ProjectIdentity { name: extract_name_from_content(content), kind, language: None, framework: None, confidence }
}

fn extract_name_from_url(url: &str) -> String {
    let stripped = Regex::new(r"(?i)^https?://(www\.)?").expect("static pattern").replace(url, "");
    let stripped = Regex::new(r"(?i)\.html?$").expect("static pattern").replace(&stripped, "");

    for pattern in DOC_URL_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&stripped) {
            if let Some(m) = caps.get(1) {
                return m.as_str().to_string();
            }
        }
    }

    let segments: Vec<&str> = stripped.split('/').filter(|s| !s.is_empty() && !s.starts_with('?')).collect();
    segments.last().map(|s| (*s).to_string()).unwrap_or_else(|| "unknown".to_string())
}

fn extract_name_from_content(content: &str) -> String {
    for pattern in NAME_FROM_CONTENT_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(content) {
            if let Some(m) = caps.get(1) {
                let name = m.as_str().trim();
                let trimmed = SUFFIX_TRIM.replace(name, "");
                return trimmed.to_string();
            }
        }
    }
    "unknown".to_string()
}

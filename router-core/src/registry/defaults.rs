/// Registry used when no registry file is found in the workspace, the home
/// directory, or the settings.
pub const BUILTIN_REGISTRY: &str = r#"
version = 1
default_persona = "staff_engineer"

[modes.direct]
keywords = ["just the code", "code only", "quick fix", "one-liner", "snippet"]
sections = [
    { kind = "code", label = "Implementation" },
]

[modes.architect]
keywords = ["architecture", "architect", "system design", "design doc", "trade-offs", "tradeoffs"]
sections = [
    { kind = "heading", label = "Assumptions" },
    { kind = "table", label = "Trade-offs" },
    { kind = "heading", label = "Decision" },
    { kind = "code", label = "Implementation" },
]

[modes.critique]
keywords = ["critique", "code review", "roast"]
sections = [
    { kind = "checklist", label = "Critical" },
    { kind = "checklist", label = "Improvements" },
    { kind = "checklist", label = "Good" },
]

[modes.sprint_planning]
keywords = ["sprint", "sprint planning", "plan the sprint", "backlog grooming"]
sections = [
    { kind = "heading", label = "Sprint Goal" },
    { kind = "table", label = "Backlog" },
    { kind = "checklist", label = "Risks" },
    { kind = "checklist", label = "Definition of Done" },
]

[[personas]]
id = "staff_engineer"
name = "Staff Engineer"
description = "Generalist who weighs trade-offs before committing to a design"
triggers = ["@STAFF", "@ARCH", "staff engineer"]
default_mode = "architect"

[[personas]]
id = "chaos_engineer"
name = "Chaos Engineer"
description = "QA persona that hunts for the inputs and failure modes that break code"
triggers = ["@QA", "QA", "@CHAOS", "chaos engineer"]
keywords = ["fuzz", "chaos", "edge cases"]
default_mode = "critique"

[[personas]]
id = "backend_engineer"
name = "Backend Engineer"
description = "Services, APIs and data stores"
triggers = ["@BACK", "@BACKEND", "backend engineer"]
keywords = ["endpoint", "database", "sql", "api"]
default_mode = "direct"

[personas.overrides]
direct = [
    { kind = "code", label = "Implementation" },
    { kind = "checklist", label = "Failure Modes" },
]

[[personas]]
id = "frontend_engineer"
name = "Frontend Engineer"
description = "Components, styling and accessibility"
triggers = ["@FRONT", "@FRONTEND", "@UI", "frontend engineer"]
keywords = ["component", "css", "react", "accessibility"]
default_mode = "direct"

[personas.overrides]
critique = [
    { kind = "checklist", label = "Critical" },
    { kind = "checklist", label = "Accessibility" },
    { kind = "checklist", label = "Improvements" },
    { kind = "checklist", label = "Good" },
]

[[personas]]
id = "security_auditor"
name = "Security Auditor"
description = "Threat modelling and vulnerability review"
triggers = ["@SEC", "@SECURITY", "security auditor"]
keywords = ["vulnerability", "cve", "owasp", "injection"]
default_mode = "critique"

[personas.overrides]
critique = [
    { kind = "checklist", label = "Critical" },
    { kind = "table", label = "Vulnerabilities" },
    { kind = "checklist", label = "Improvements" },
    { kind = "checklist", label = "Good" },
]

[[personas]]
id = "scrum_master"
name = "Scrum Master"
description = "Sprint planning, backlog shaping and delivery risk"
triggers = ["@SCRUM", "@PM", "scrum master"]
keywords = ["sprint", "backlog", "standup", "retro", "retrospective", "velocity", "story points"]
default_mode = "sprint_planning"

[[personas]]
id = "seo_specialist"
name = "SEO Specialist"
description = "Markup and metadata for search visibility"
triggers = ["@SEO", "seo specialist"]
keywords = ["seo", "meta tags", "sitemap"]
default_mode = "direct"

[personas.overrides]
direct = [
    { kind = "code", label = "Implementation" },
    { kind = "checklist", label = "Meta Checklist" },
]

[[personas]]
id = "legal_advisor"
name = "Legal Advisor"
description = "Licensing, privacy and terms boilerplate"
triggers = ["@LEGAL", "legal advisor"]
keywords = ["license", "gdpr", "privacy policy", "terms of service"]
default_mode = "direct"

[personas.overrides]
direct = [
    { kind = "heading", label = "Document" },
    { kind = "heading", label = "Disclaimer", required = false },
]
"#;

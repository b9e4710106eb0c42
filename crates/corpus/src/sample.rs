use crate::document::Document;

/// The five-entry knowledge base served when no corpus file is configured.
pub fn sample_documents() -> Vec<Document> {
    vec![
        Document::new(
            "doc1",
            "Python Best Practices",
            "Python best practices include using virtual environments, type hints, and docstrings. \
             Virtual environments help isolate project dependencies, type hints improve code \
             readability and catch errors early, and docstrings provide essential documentation \
             for functions and classes.",
        )
        .with_metadata("category", "programming")
        .with_metadata("language", "python"),
        Document::new(
            "doc2",
            "FastAPI Overview",
            "FastAPI is a modern web framework for building APIs with Python 3.7+. It provides \
             automatic API documentation, type validation, and high performance through \
             async/await support.",
        )
        .with_metadata("category", "framework")
        .with_metadata("language", "python"),
        Document::new(
            "doc3",
            "Database Design",
            "Good database design involves normalization, indexing, and proper relationships. \
             Normalization reduces redundancy, indexes improve query performance, and proper \
             relationships maintain data integrity.",
        )
        .with_metadata("category", "database")
        .with_metadata("topic", "design"),
        Document::new(
            "doc4",
            "Security Guidelines",
            "Always validate input, use HTTPS, and follow the principle of least privilege. \
             Input validation prevents injection attacks, HTTPS encrypts data in transit, and \
             least privilege limits potential damage from breaches.",
        )
        .with_metadata("category", "security")
        .with_metadata("topic", "guidelines"),
        Document::new(
            "doc5",
            "Testing Strategies",
            "Include unit tests, integration tests, and end-to-end tests in your test suite. \
             Unit tests verify individual components, integration tests check component \
             interactions, and end-to-end tests validate complete workflows.",
        )
        .with_metadata("category", "testing")
        .with_metadata("topic", "strategies"),
    ]
}

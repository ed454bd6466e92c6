//! Built-in lending fallback payloads.
//!
//! Every generator returns fixed ids and fixed timestamps, so two demos
//! started from the same build render identical screens.

use axum::http::Method;
use serde_json::{json, Value};

use super::FallbackDescriptor;

const AS_OF: &str = "2024-01-15T09:00:00Z";

/// Specific patterns before parameterised ones.
pub fn lending_descriptors() -> Vec<FallbackDescriptor> {
    vec![
        FallbackDescriptor::new(Method::GET, "/dashboard/stats", dashboard_stats),
        FallbackDescriptor::new(Method::GET, "/applications", application_list),
        FallbackDescriptor::new(Method::POST, "/applications", application_created),
        FallbackDescriptor::new(Method::GET, "/applications/{id}/documents", application_documents),
        FallbackDescriptor::new(Method::POST, "/applications/{id}/review", review_decision),
        FallbackDescriptor::new(Method::GET, "/applications/{id}", application_detail),
        FallbackDescriptor::new(Method::PUT, "/applications/{id}", application_updated),
        FallbackDescriptor::new(Method::PATCH, "/applications/{id}", application_updated),
        FallbackDescriptor::new(Method::POST, "/documents/{id}/extract", document_extraction),
        FallbackDescriptor::new(Method::GET, "/reviews", review_queue),
        FallbackDescriptor::new(Method::POST, "/ai/summarize", ai_summary),
        FallbackDescriptor::new(Method::POST, "/notifications", notification_sent),
    ]
}

fn application(id: &str, applicant: &str, amount: u64, purpose: &str, status: &str) -> Value {
    json!({
        "id": id,
        "applicantName": applicant,
        "loanAmount": amount,
        "loanPurpose": purpose,
        "status": status,
        "createdAt": "2024-01-10T14:30:00Z",
        "updatedAt": AS_OF,
    })
}

fn application_list() -> Value {
    json!([
        application("APP-1001", "Jordan Ellis", 250_000, "home_purchase", "under_review"),
        application("APP-1002", "Priya Raman", 45_000, "auto", "approved"),
        application("APP-1003", "Marcus Chen", 120_000, "business_expansion", "documents_pending"),
        application("APP-1004", "Sofia Alvarez", 18_500, "debt_consolidation", "submitted"),
    ])
}

fn application_detail() -> Value {
    let mut detail = application("APP-1001", "Jordan Ellis", 250_000, "home_purchase", "under_review");
    if let Value::Object(map) = &mut detail {
        map.insert(
            "applicant".into(),
            json!({
                "email": "jordan.ellis@example.com",
                "annualIncome": 98_000,
                "employmentStatus": "employed",
                "creditScore": 742,
            }),
        );
        map.insert("termMonths".into(), json!(360));
        map.insert("interestRate".into(), json!(6.25));
    }
    detail
}

fn application_created() -> Value {
    application("APP-2001", "Demo Applicant", 50_000, "personal", "submitted")
}

fn application_updated() -> Value {
    application("APP-1001", "Jordan Ellis", 250_000, "home_purchase", "updated")
}

fn application_documents() -> Value {
    json!([
        {
            "id": "DOC-501",
            "applicationId": "APP-1001",
            "type": "pay_stub",
            "fileName": "paystub-2023-12.pdf",
            "status": "verified",
            "uploadedAt": "2024-01-11T10:00:00Z",
        },
        {
            "id": "DOC-502",
            "applicationId": "APP-1001",
            "type": "bank_statement",
            "fileName": "statement-2023-12.pdf",
            "status": "processing",
            "uploadedAt": "2024-01-12T16:45:00Z",
        },
    ])
}

fn document_extraction() -> Value {
    json!({
        "documentId": "DOC-501",
        "documentType": "pay_stub",
        "confidence": 0.94,
        "fields": {
            "employerName": "Northwind Logistics",
            "payPeriodEnd": "2023-12-31",
            "grossPay": 4_083.33,
            "netPay": 3_120.75,
        },
        "extractedAt": AS_OF,
    })
}

fn review_queue() -> Value {
    json!([
        {
            "id": "REV-301",
            "applicationId": "APP-1001",
            "assignedTo": "underwriter-1",
            "priority": "high",
            "dueAt": "2024-01-17T17:00:00Z",
        },
        {
            "id": "REV-302",
            "applicationId": "APP-1003",
            "assignedTo": "underwriter-2",
            "priority": "normal",
            "dueAt": "2024-01-19T17:00:00Z",
        },
    ])
}

fn review_decision() -> Value {
    json!({
        "id": "REV-301",
        "applicationId": "APP-1001",
        "decision": "approved",
        "conditions": ["Verify employment by phone"],
        "decidedAt": AS_OF,
    })
}

fn dashboard_stats() -> Value {
    json!({
        "totalApplications": 128,
        "pendingReview": 17,
        "approvedThisMonth": 42,
        "declinedThisMonth": 9,
        "averageLoanAmount": 86_400,
        "averageDecisionHours": 31.5,
        "asOf": AS_OF,
    })
}

fn ai_summary() -> Value {
    json!({
        "summary": "Applicant shows stable employment and a debt-to-income ratio of 28%. \
                    Documentation is complete apart from one pending bank statement.",
        "riskLevel": "low",
        "model": "demo",
        "generatedAt": AS_OF,
    })
}

fn notification_sent() -> Value {
    json!({
        "id": "NTF-901",
        "channel": "loan-officers",
        "delivered": true,
        "sentAt": AS_OF,
    })
}

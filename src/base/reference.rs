//! Immutable reference data: the comparison baseline and the known-company table.
//!
//! Both are defaults; the configuration may replace the capability block or
//! add entries to the table at startup.

use std::collections::HashMap;

/// Name of the product every competitor is compared against.
pub const REFERENCE_PRODUCT_NAME: &str = "Monite";

/// Capability description of the reference product, embedded verbatim in every prompt.
pub const REFERENCE_CAPABILITIES: &str = r#####"
MONITE'S DETAILED AP/AR CAPABILITIES FOR ACCURATE COMPARISON:

ACCOUNTS PAYABLE (AP) FUNCTIONALITY:
- Bill capture: Email forwarding, manual upload, OCR-powered data extraction
- Invoice processing: Automated line-item extraction, coding suggestions, duplicate detection
- Approval workflows: Custom multi-step approval chains, delegation, escalation rules
- Vendor management: Vendor onboarding, payment terms, contact management
- Payment execution: ACH, wire transfers, international payments, check printing
- Payment scheduling: Batch payments, payment date optimization, cash flow management
- Reconciliation: Bank feed integration, automated matching, exception handling
- Reporting: Spend analytics, vendor reports, approval audit trails

ACCOUNTS RECEIVABLE (AR) FUNCTIONALITY:
- Invoice creation: Template-based invoicing, recurring billing, milestone invoicing
- Quote management: Quote-to-invoice conversion, approval workflows, version control
- Payment collection: Payment links, multiple payment methods (card, ACH, bank transfer)
- Payment reminders: Automated dunning sequences, customizable templates
- Customer management: Credit limits, payment terms, contact management
- Reconciliation: Payment matching, allocation, partial payment handling
- Reporting: Aging reports, collection analytics, cash flow forecasting

E-INVOICING & COMPLIANCE:
- Peppol e-invoicing: EU compliance, automated tax calculations
- Multi-country support: 30+ jurisdictions, local tax requirements
- Document formats: PDF generation, XML standards, digital signatures

TECHNICAL ARCHITECTURE:
- REST API: 200+ endpoints, webhook support, rate limiting
- SDK Options: React components, JavaScript SDK, Python SDK
- Integration patterns: Embedded iframes, white-label UI, headless API
- Authentication: OAuth 2.0, API keys, JWT tokens
- Data sync: Real-time webhooks, batch processing, audit logs

ACCOUNTING SYSTEM INTEGRATIONS:
- 40+ platforms: QuickBooks, Xero, NetSuite, Sage, FreshBooks, Wave
- Sync capabilities: Chart of accounts, tax rates, customers, vendors
- Mapping: Flexible field mapping, custom categorization
- Data flow: Bi-directional sync, conflict resolution

EMBEDDED FINANCE POSITIONING:
- Target market: B2B SaaS platforms, marketplaces, neobanks
- Implementation: 2-week average integration time
- Revenue model: Transaction-based pricing, revenue sharing options
- Deployment: Cloud-native, EU and US data centers
"#####;

/// Pre-written summaries of companies that routinely block scrapers.
const KNOWN_COMPANIES: &[(&str, &str)] = &[
    (
        "bill.com",
        "BILL (bill.com) is a US financial operations platform for SMBs covering accounts payable automation, accounts receivable invoicing, spend management and vendor payments (ACH, card, international wire). It syncs with QuickBooks, Xero, NetSuite and Sage and sells heavily through accounting firms and banks.",
    ),
    (
        "tipalti.com",
        "Tipalti automates global payables: supplier onboarding, tax form collection, invoice processing with PO matching, multi-entity approvals and mass payments in 120+ currencies. It targets mid-market and enterprise finance teams and integrates with NetSuite, Sage Intacct and QuickBooks.",
    ),
    (
        "melio.com",
        "Melio is a B2B payments platform for small businesses focused on bill pay and receivables. Vendors can be paid by ACH, card or check; it offers payment links for collections and is embedded by partners such as Capital One and Fiserv.",
    ),
    (
        "ramp.com",
        "Ramp is a corporate card and spend management platform that has expanded into bill pay, procurement and accounting automation. It offers OCR bill capture, approval workflows, vendor payments and deep ERP integrations, and has raised well over $1B in funding.",
    ),
    (
        "stampli.com",
        "Stampli is an AI-driven accounts payable automation product centred on invoice capture, collaboration around invoices, approval routing and payments. It integrates with 70+ ERPs and targets mid-market finance teams.",
    ),
    (
        "codat.io",
        "Codat provides a universal API for small business data, connecting to accounting, banking and commerce platforms. Its products include bill pay sync and accounting integrations aimed at lenders and B2B SaaS platforms.",
    ),
];

/// The built-in known-company table, keyed by bare domain (no `www.`).
pub fn known_companies() -> HashMap<String, String> {
    KNOWN_COMPANIES.iter().map(|(domain, summary)| (domain.to_string(), summary.to_string())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_companies_are_keyed_by_bare_domain() {
        let table = known_companies();

        assert!(table.contains_key("bill.com"));
        assert!(table.keys().all(|k| !k.starts_with("www.") && !k.contains("://")));
        assert!(table.values().all(|v| !v.is_empty()));
    }
}

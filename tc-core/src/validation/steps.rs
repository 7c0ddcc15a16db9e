//! Per-step validation rules for the transaction form.
//!
//! Every rule the form enforces lives in the tables below, one table per
//! step. Role-dependent and flag-gated requirements are expressed on the
//! rule itself so each table reads top to bottom as the page does.

use tracing::debug;

use crate::models::{AgentRole, Client, FormStep, TransactionFormData};

use super::fields::{
    validate_amount, validate_date, validate_ein, validate_email, validate_mls,
    validate_percentage, validate_phone,
};
use super::rules::{FieldRule, FieldValue, Reader};
use super::FieldErrors;

pub const MLS_FORMAT_MESSAGE: &str = "MLS number must be in format: 123456 or PM-123456";
pub const NO_CLIENTS_MESSAGE: &str = "At least one client is required";
const PERCENTAGE_MESSAGE: &str = "Enter a percentage between 0 and 100";
const AMOUNT_MESSAGE: &str = "Enter a valid dollar amount";

type FormRule = FieldRule<TransactionFormData>;

fn rule(
    key: &'static str,
    read: Reader<TransactionFormData>,
) -> FormRule {
    FieldRule::new(key, read)
}

fn client_rule(
    key: &'static str,
    read: Reader<Client>,
) -> FieldRule<Client> {
    FieldRule::new(key, read)
}

fn seller_side(data: &TransactionFormData) -> bool {
    data.role().is_some_and(|r| r.represents_seller())
}

fn fee_format(s: &str) -> bool {
    validate_amount(s) || validate_percentage(s)
}

fn agent_role_rules() -> Vec<FormRule> {
    vec![
        rule("role", |d| FieldValue::Flag(d.agent_data.role.is_some()))
            .required("Please select your role"),
    ]
}

fn property_rules() -> Vec<FormRule> {
    vec![
        rule("mlsNumber", |d| FieldValue::Text(&d.property_data.mls_number))
            .required_if(seller_side, "MLS number is required")
            .format(validate_mls, MLS_FORMAT_MESSAGE),
        rule("address", |d| FieldValue::Text(&d.property_data.address))
            .required("Property address is required"),
        rule("salePrice", |d| FieldValue::Text(&d.property_data.sale_price))
            .required("Sale price is required")
            .format(validate_amount, "Sale price must be a valid amount"),
        rule("status", |d| FieldValue::Text(&d.property_data.status))
            .required("Property status is required"),
        rule("county", |d| FieldValue::Text(&d.property_data.county))
            .required("County is required"),
        rule("propertyType", |d| FieldValue::Text(&d.property_data.property_type))
            .required("Property type is required"),
        rule("closingDate", |d| FieldValue::Text(&d.property_data.closing_date))
            .required("Closing date is required")
            .format(validate_date, "Closing date must be a valid date"),
    ]
}

fn client_rules(role: Option<AgentRole>) -> Vec<FieldRule<Client>> {
    let mut rules = vec![
        client_rule("name", |c| FieldValue::Text(&c.name)).required("Client name is required"),
        client_rule("email", |c| FieldValue::Text(&c.email))
            .format(validate_email, "Please enter a valid email address"),
        client_rule("phone", |c| FieldValue::Text(&c.phone))
            .format(validate_phone, "Please enter a valid phone number"),
        client_rule("address", |c| FieldValue::Text(&c.address))
            .required("Client address is required"),
        client_rule("maritalStatus", |c| FieldValue::Text(&c.marital_status))
            .required("Marital status is required"),
    ];
    if role == Some(AgentRole::DualAgent) {
        rules.push(
            client_rule("type", |c| FieldValue::Flag(c.client_type.is_some()))
                .required("Please select whether the client is a buyer or seller"),
        );
    }
    rules
}

fn commission_rules() -> Vec<FormRule> {
    vec![
        rule("totalCommissionPercentage", |d| {
            FieldValue::Text(&d.commission_data.total_commission_percentage)
        })
        .required_if(seller_side, "Total commission percentage is required")
        .format(validate_percentage, PERCENTAGE_MESSAGE),
        rule("listingAgentPercentage", |d| {
            FieldValue::Text(&d.commission_data.listing_agent_percentage)
        })
        .required_if(seller_side, "Listing agent percentage is required")
        .format(validate_percentage, PERCENTAGE_MESSAGE),
        rule("buyersAgentPercentage", |d| {
            FieldValue::Text(&d.commission_data.buyers_agent_percentage)
        })
        .required("Buyer's agent percentage is required")
        .format(validate_percentage, PERCENTAGE_MESSAGE),
        rule("sellersAssist", |d| FieldValue::Text(&d.commission_data.sellers_assist))
            .gated_by(
                |d| d.commission_data.has_sellers_assist,
                "Seller's assist amount is required",
            )
            .format(validate_amount, AMOUNT_MESSAGE),
        rule("brokerFeeAmount", |d| {
            FieldValue::Text(&d.commission_data.broker_fee_amount)
        })
        .gated_by(|d| d.commission_data.has_broker_fee, "Broker fee amount is required")
        .format(validate_amount, AMOUNT_MESSAGE),
        rule("referralParty", |d| FieldValue::Text(&d.commission_data.referral_party))
            .gated_by(|d| d.commission_data.is_referral, "Referral party is required"),
        rule("referralFee", |d| FieldValue::Text(&d.commission_data.referral_fee))
            .gated_by(|d| d.commission_data.is_referral, "Referral fee is required")
            .format(fee_format, "Referral fee must be an amount or a percentage"),
        rule("brokerEin", |d| FieldValue::Text(&d.commission_data.broker_ein))
            .gated_by(|d| d.commission_data.is_referral, "Broker EIN is required")
            .format(validate_ein, "EIN must be in format: 12-3456789"),
    ]
}

fn property_details_rules() -> Vec<FormRule> {
    vec![
        rule("hoaName", |d| FieldValue::Text(&d.property_details_data.hoa_name)).gated_by(
            |d| d.property_details_data.resale_cert_required,
            "HOA name is required when a resale certificate is needed",
        ),
        rule("municipality", |d| {
            FieldValue::Text(&d.property_details_data.municipality)
        })
        .gated_by(
            |d| d.property_details_data.co_required,
            "Municipality is required when a CO is needed",
        ),
        rule("firstRightName", |d| {
            FieldValue::Text(&d.property_details_data.first_right_name)
        })
        .gated_by(
            |d| d.property_details_data.first_right_of_refusal,
            "Name of the party holding first right of refusal is required",
        ),
        rule("attorneyName", |d| {
            FieldValue::Text(&d.property_details_data.attorney_name)
        })
        .gated_by(
            |d| d.property_details_data.attorney_representation,
            "Attorney name is required",
        ),
        rule("warrantyCompany", |d| {
            FieldValue::Text(&d.warranty_data.warranty_company)
        })
        .gated_by(|d| d.warranty_data.home_warranty, "Warranty company is required"),
        rule("warrantyCost", |d| FieldValue::Text(&d.warranty_data.warranty_cost))
            .gated_by(|d| d.warranty_data.home_warranty, "Warranty cost is required")
            .format(validate_amount, AMOUNT_MESSAGE),
        rule("paidBy", |d| FieldValue::Text(&d.warranty_data.paid_by)).gated_by(
            |d| d.warranty_data.home_warranty,
            "Please specify who pays for the warranty",
        ),
    ]
}

fn title_company_rules() -> Vec<FormRule> {
    vec![
        rule("titleCompanyName", |d| {
            FieldValue::Text(&d.title_company_data.title_company_name)
        })
        .required("Title company name is required"),
    ]
}

fn documents_rules() -> Vec<FormRule> {
    vec![
        rule("confirmDocuments", |d| {
            FieldValue::Flag(d.documents_data.confirm_documents)
        })
        .required("Please confirm that all required documents have been provided"),
    ]
}

fn signature_rules() -> Vec<FormRule> {
    vec![
        rule("agentName", |d| FieldValue::Text(&d.signature_data.agent_name))
            .required("Agent name is required"),
        rule("signature", |d| FieldValue::Text(&d.signature_data.signature))
            .required("Signature is required"),
        rule("infoConfirmed", |d| FieldValue::Flag(d.signature_data.info_confirmed))
            .required("Please confirm the information provided is accurate"),
        rule("termsAccepted", |d| FieldValue::Flag(d.signature_data.terms_accepted))
            .required("You must accept the terms and conditions"),
    ]
}

/// The rule table for a single step. Client rules are handled separately
/// because they repeat per list entry.
pub fn rules_for(step: FormStep) -> Vec<FormRule> {
    match step {
        FormStep::AgentRole => agent_role_rules(),
        FormStep::Property => property_rules(),
        FormStep::Clients => Vec::new(),
        FormStep::Commission => commission_rules(),
        FormStep::PropertyDetails => property_details_rules(),
        FormStep::TitleCompany => title_company_rules(),
        FormStep::Documents => documents_rules(),
        FormStep::AdditionalInfo => Vec::new(),
        FormStep::Signature => signature_rules(),
    }
}

fn validate_clients(
    data: &TransactionFormData,
    errors: &mut FieldErrors,
) {
    if data.clients.is_empty() {
        errors.add("clients", NO_CLIENTS_MESSAGE);
        return;
    }

    let rules = client_rules(data.role());
    for (index, client) in data.clients.iter().enumerate() {
        for rule in &rules {
            let key = format!("clients[{index}].{}", rule.key);
            rule.check_into(client, &key, errors);
        }
    }
}

/// Validate one step of the form.
///
/// Reads only the sections that belong to `step`. Step numbers outside the
/// form produce no errors. An empty result means the step is valid.
pub fn validate_step(
    step: u8,
    data: &TransactionFormData,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let Some(step) = FormStep::from_number(step) else {
        return errors;
    };

    if step == FormStep::Clients {
        validate_clients(data, &mut errors);
    } else {
        for rule in rules_for(step) {
            rule.check(data, &mut errors);
        }
    }

    if !errors.is_empty() {
        debug!(step = step.number(), fields = errors.len(), "step failed validation");
    }
    errors
}

/// Validate every step and merge the results.
pub fn validate_all(data: &TransactionFormData) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for step in FormStep::ALL {
        errors.merge(validate_step(step.number(), data));
    }
    errors
}

/// Steps that currently have at least one error, in form order.
pub fn invalid_steps(data: &TransactionFormData) -> Vec<FormStep> {
    FormStep::ALL
        .into_iter()
        .filter(|step| !validate_step(step.number(), data).is_empty())
        .collect()
}

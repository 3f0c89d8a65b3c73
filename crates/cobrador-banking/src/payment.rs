//! Payment request bodies accepted by the banking API.

use chrono::{Local, NaiveDate};
use cobrador_core::{Boleto, PixCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BankingError;

/// Account kind of a bank-data PIX recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    ContaCorrente,
    ContaPoupanca,
    ContaSalario,
    ContaPagamento,
}

/// Recipient institution, identified by its ISPB code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialInstitution {
    pub ispb: String,
}

/// Where a PIX transfer goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tipo", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PixDestination {
    /// A registered PIX key (CPF/CNPJ, e-mail, phone or random key).
    Chave { chave: String },

    /// Plain bank account data.
    #[serde(rename_all = "camelCase")]
    DadosBancarios {
        conta_corrente: String,
        tipo_conta: AccountType,
        cpf_cnpj: String,
        agencia: String,
        nome: String,
        instituicao_financeira: FinancialInstitution,
    },

    /// A BR-Code copy-and-paste payload.
    #[serde(rename_all = "camelCase")]
    PixCopiaECola { pix_copia_e_cola: String },
}

/// A PIX transfer request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PixPayment {
    /// Sent as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub valor: Decimal,
    /// Scheduled date, `YYYY-MM-DD`.
    pub data_pagamento: NaiveDate,
    pub descricao: String,
    pub destinatario: PixDestination,
}

impl PixPayment {
    /// Builds a transfer, dated today (local clock) unless a date is given.
    #[must_use]
    pub fn new(
        valor: Decimal,
        descricao: impl Into<String>,
        destinatario: PixDestination,
        data_pagamento: Option<NaiveDate>,
    ) -> Self {
        Self {
            valor,
            data_pagamento: data_pagamento.unwrap_or_else(|| Local::now().date_naive()),
            descricao: descricao.into(),
            destinatario,
        }
    }

    /// Transfer paying a BR-Code scraped from an invoice, dated today.
    #[must_use]
    pub fn copy_and_paste(code: &PixCode, valor: Decimal, descricao: impl Into<String>) -> Self {
        Self::new(
            valor,
            descricao,
            PixDestination::PixCopiaECola {
                pix_copia_e_cola: code.as_str().to_string(),
            },
            None,
        )
    }
}

/// Bank acknowledgement of a PIX request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixPaymentResponse {
    /// Tracking id of the request.
    pub codigo_solicitacao: String,
    #[serde(default)]
    pub tipo_retorno: Option<String>,
}

/// A boleto payment request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoletoPayment {
    /// Barcode or digitable line.
    pub cod_barra_linha_digitavel: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub valor_pagar: Decimal,
    pub data_vencimento: NaiveDate,
}

impl TryFrom<&Boleto> for BoletoPayment {
    type Error = BankingError;

    fn try_from(boleto: &Boleto) -> Result<Self, Self::Error> {
        boleto
            .ensure_payable()
            .map_err(|e| BankingError::InvalidPayment(e.to_string()))?;

        let valor_pagar = boleto
            .amount()
            .ok_or_else(|| BankingError::InvalidPayment("boleto amount is missing".into()))?;
        let data_vencimento = boleto
            .due_date()
            .ok_or_else(|| BankingError::InvalidPayment("boleto due date is missing".into()))?;

        Ok(Self {
            cod_barra_linha_digitavel: cobrador_core::normalize_payment_code(&boleto.payment_code),
            valor_pagar,
            data_vencimento,
        })
    }
}

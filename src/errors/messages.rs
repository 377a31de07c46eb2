//! User-facing messages per error kind.

use serde::{Deserialize, Serialize};

use crate::errors::kind::ErrorKind;

/// Language of user-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en")]
    En,
}

/// Fixed message for `kind` in `locale`. Never includes raw error text.
pub fn user_message(kind: ErrorKind, locale: Locale) -> &'static str {
    match locale {
        Locale::PtBr => match kind {
            ErrorKind::NetworkError => "Erro de conexão com a rede. Verifique sua internet.",
            ErrorKind::WalletError => "Erro na carteira. Verifique se está conectada.",
            ErrorKind::ContractError => "Erro no contrato inteligente.",
            ErrorKind::TransactionError => "Erro ao processar a transação.",
            ErrorKind::ValidationError => "Dados inválidos fornecidos.",
            ErrorKind::TimeoutError => "Operação expirou. Tente novamente.",
            ErrorKind::InsufficientFunds => "Saldo insuficiente para completar a transação.",
            ErrorKind::UserRejected => "Transação rejeitada pelo usuário.",
            ErrorKind::UnknownError => "Erro desconhecido. Tente novamente.",
        },
        Locale::En => match kind {
            ErrorKind::NetworkError => "Could not reach the network. Check your connection.",
            ErrorKind::WalletError => "Wallet error. Make sure your wallet is connected.",
            ErrorKind::ContractError => "The smart contract returned an error.",
            ErrorKind::TransactionError => "The transaction could not be processed.",
            ErrorKind::ValidationError => "Invalid data provided.",
            ErrorKind::TimeoutError => "The operation timed out. Please try again.",
            ErrorKind::InsufficientFunds => "Insufficient balance to complete the transaction.",
            ErrorKind::UserRejected => "Transaction rejected by the user.",
            ErrorKind::UnknownError => "Unknown error. Please try again.",
        },
    }
}

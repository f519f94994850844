// src/models/auth.rs

use serde::{Deserialize, Serialize};

// "Claims" do JWT emitido pelo serviço de autenticação.
// Aqui só verificamos; a emissão (login/refresh) fica fora deste backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,  // ID do usuário
    pub exp: usize,  // Expiration time
    #[serde(default)]
    pub iat: usize,  // Issued At
}

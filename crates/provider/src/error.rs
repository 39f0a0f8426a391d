// This file is part of Opkit.
//
// Opkit is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Opkit is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Opkit.
// If not, see https://www.gnu.org/licenses/.

//! Provider errors.

/// Errors surfaced by collaborator implementations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// A read returned data that does not match the expected result shape.
    /// Raised at the decode boundary so malformed responses never propagate
    /// into the core as loosely-typed values.
    #[error("unexpected rpc result shape: {context}")]
    UnexpectedRpcShape {
        /// What was being decoded and what was wrong with it.
        context: String,
    },
    /// The remote endpoint answered with an error.
    #[error("rpc error: {0}")]
    Rpc(String),
    /// Transport or implementation-specific failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

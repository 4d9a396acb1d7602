//! Instruction payloads and account lists for the six program entry points.
//!
//! Payload = `sha256("global:<snake_case_name>")[..8]` followed by the Borsh
//! encoding of the arguments. Account order follows the program's interface
//! description and is part of the contract.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use solana_sdk_ids::system_program;

use crate::error::CodecError;
use crate::pda;
use crate::types::{DesignId, Lamports, OrderStatus};

/// Instruction discriminators.
pub mod sighash {
    pub const INITIALIZE_STORE: [u8; 8] = [109, 149, 210, 214, 188, 126, 220, 140];
    pub const CREATE_DESIGN: [u8; 8] = [117, 172, 50, 80, 246, 123, 120, 146];
    pub const UPDATE_DESIGN: [u8; 8] = [185, 154, 217, 91, 138, 50, 42, 40];
    pub const TOGGLE_DESIGN_AVAILABILITY: [u8; 8] = [217, 128, 249, 85, 166, 176, 162, 246];
    pub const CREATE_ORDER: [u8; 8] = [141, 54, 37, 207, 237, 210, 250, 215];
    pub const UPDATE_ORDER_STATUS: [u8; 8] = [88, 95, 133, 241, 63, 159, 32, 71];
}

/// Arguments of `createDesign`.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct NewDesign {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub price: Lamports,
}

/// Arguments of `updateDesign`.
///
/// Every field is optional; `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct DesignUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<Lamports>,
    pub available: Option<bool>,
}

impl DesignUpdate {
    /// True when the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.price.is_none()
            && self.available.is_none()
    }
}

/// A decoded program instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreInstruction {
    InitializeStore,
    CreateDesign(NewDesign),
    UpdateDesign(DesignUpdate),
    ToggleDesignAvailability,
    CreateOrder { shipping_info: String },
    UpdateOrderStatus { new_status: OrderStatus },
}

impl StoreInstruction {
    /// Entry point name as declared by the program.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InitializeStore => "initializeStore",
            Self::CreateDesign(_) => "createDesign",
            Self::UpdateDesign(_) => "updateDesign",
            Self::ToggleDesignAvailability => "toggleDesignAvailability",
            Self::CreateOrder { .. } => "createOrder",
            Self::UpdateOrderStatus { .. } => "updateOrderStatus",
        }
    }

    #[must_use]
    pub const fn discriminator(&self) -> [u8; 8] {
        match self {
            Self::InitializeStore => sighash::INITIALIZE_STORE,
            Self::CreateDesign(_) => sighash::CREATE_DESIGN,
            Self::UpdateDesign(_) => sighash::UPDATE_DESIGN,
            Self::ToggleDesignAvailability => sighash::TOGGLE_DESIGN_AVAILABILITY,
            Self::CreateOrder { .. } => sighash::CREATE_ORDER,
            Self::UpdateOrderStatus { .. } => sighash::UPDATE_ORDER_STATUS,
        }
    }

    /// Encode the instruction payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments cannot be written.
    pub fn pack(&self) -> Result<Vec<u8>, CodecError> {
        let mut data = self.discriminator().to_vec();
        let written = match self {
            Self::InitializeStore | Self::ToggleDesignAvailability => Ok(()),
            Self::CreateDesign(args) => args.serialize(&mut data),
            Self::UpdateDesign(args) => args.serialize(&mut data),
            Self::CreateOrder { shipping_info } => shipping_info.serialize(&mut data),
            Self::UpdateOrderStatus { new_status } => new_status.serialize(&mut data),
        };
        written.map_err(|source| CodecError::Body {
            kind: self.name(),
            source,
        })?;
        Ok(data)
    }

    /// Decode an instruction payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the discriminator is unknown or the arguments are
    /// malformed.
    pub fn unpack(data: &[u8]) -> Result<Self, CodecError> {
        let (discriminator, mut args) =
            data.split_first_chunk::<8>().ok_or(CodecError::TooShort {
                kind: "instruction",
                len: data.len(),
            })?;
        let body = |kind: &'static str| move |source| CodecError::Body { kind, source };

        match *discriminator {
            sighash::INITIALIZE_STORE => Ok(Self::InitializeStore),
            sighash::CREATE_DESIGN => NewDesign::deserialize(&mut args)
                .map(Self::CreateDesign)
                .map_err(body("createDesign")),
            sighash::UPDATE_DESIGN => DesignUpdate::deserialize(&mut args)
                .map(Self::UpdateDesign)
                .map_err(body("updateDesign")),
            sighash::TOGGLE_DESIGN_AVAILABILITY => Ok(Self::ToggleDesignAvailability),
            sighash::CREATE_ORDER => String::deserialize(&mut args)
                .map(|shipping_info| Self::CreateOrder { shipping_info })
                .map_err(body("createOrder")),
            sighash::UPDATE_ORDER_STATUS => OrderStatus::deserialize(&mut args)
                .map(|new_status| Self::UpdateOrderStatus { new_status })
                .map_err(body("updateOrderStatus")),
            other => Err(CodecError::UnknownInstruction(other)),
        }
    }

    fn into_instruction(
        self,
        program_id: &Pubkey,
        accounts: Vec<AccountMeta>,
    ) -> Result<Instruction, CodecError> {
        let data = self.pack()?;
        Ok(Instruction::new_with_bytes(*program_id, &data, accounts))
    }
}

// =============================================================================
// Instruction builders
// =============================================================================

/// `initializeStore`: `[store (w), authority (w, s), system_program]`.
///
/// # Errors
///
/// Returns an error if the payload cannot be encoded.
pub fn initialize_store(program_id: &Pubkey, authority: &Pubkey) -> Result<Instruction, CodecError> {
    let (store, _) = pda::store_address(program_id);
    StoreInstruction::InitializeStore.into_instruction(
        program_id,
        vec![
            AccountMeta::new(store, false),
            AccountMeta::new(*authority, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
    )
}

/// `createDesign`: `[design (w), store (w), authority (w, s), system_program]`.
///
/// `design_id` must be the store's current `designs_count`.
///
/// # Errors
///
/// Returns an error if the payload cannot be encoded.
pub fn create_design(
    program_id: &Pubkey,
    authority: &Pubkey,
    design_id: DesignId,
    design: NewDesign,
) -> Result<Instruction, CodecError> {
    let (store, _) = pda::store_address(program_id);
    let (design_address, _) = pda::design_address(program_id, &store, design_id);
    StoreInstruction::CreateDesign(design).into_instruction(
        program_id,
        vec![
            AccountMeta::new(design_address, false),
            AccountMeta::new(store, false),
            AccountMeta::new(*authority, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
    )
}

/// `updateDesign`: `[design (w), store, authority (s)]`.
///
/// # Errors
///
/// Returns an error if the payload cannot be encoded.
pub fn update_design(
    program_id: &Pubkey,
    authority: &Pubkey,
    design: &Pubkey,
    update: DesignUpdate,
) -> Result<Instruction, CodecError> {
    let (store, _) = pda::store_address(program_id);
    StoreInstruction::UpdateDesign(update).into_instruction(
        program_id,
        vec![
            AccountMeta::new(*design, false),
            AccountMeta::new_readonly(store, false),
            AccountMeta::new_readonly(*authority, true),
        ],
    )
}

/// `toggleDesignAvailability`: `[design (w), store, authority (s)]`.
///
/// # Errors
///
/// Returns an error if the payload cannot be encoded.
pub fn toggle_design_availability(
    program_id: &Pubkey,
    authority: &Pubkey,
    design: &Pubkey,
) -> Result<Instruction, CodecError> {
    let (store, _) = pda::store_address(program_id);
    StoreInstruction::ToggleDesignAvailability.into_instruction(
        program_id,
        vec![
            AccountMeta::new(*design, false),
            AccountMeta::new_readonly(store, false),
            AccountMeta::new_readonly(*authority, true),
        ],
    )
}

/// `createOrder`: `[order (w), design (w), store (w), store_authority (w),
/// buyer (w, s), system_program]`.
///
/// Price and availability are not arguments: the program reads them from the
/// design account when the transaction executes.
///
/// # Errors
///
/// Returns an error if the payload cannot be encoded.
pub fn create_order(
    program_id: &Pubkey,
    buyer: &Pubkey,
    store_authority: &Pubkey,
    design: &Pubkey,
    shipping_info: String,
) -> Result<Instruction, CodecError> {
    let (store, _) = pda::store_address(program_id);
    let (order, _) = pda::order_address(program_id, &store, buyer);
    StoreInstruction::CreateOrder { shipping_info }.into_instruction(
        program_id,
        vec![
            AccountMeta::new(order, false),
            AccountMeta::new(*design, false),
            AccountMeta::new(store, false),
            AccountMeta::new(*store_authority, false),
            AccountMeta::new(*buyer, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
    )
}

/// `updateOrderStatus`: `[order (w), store, authority (s)]`.
///
/// # Errors
///
/// Returns an error if the payload cannot be encoded.
pub fn update_order_status(
    program_id: &Pubkey,
    authority: &Pubkey,
    order: &Pubkey,
    new_status: OrderStatus,
) -> Result<Instruction, CodecError> {
    let (store, _) = pda::store_address(program_id);
    StoreInstruction::UpdateOrderStatus { new_status }.into_instruction(
        program_id,
        vec![
            AccountMeta::new(*order, false),
            AccountMeta::new_readonly(store, false),
            AccountMeta::new_readonly(*authority, true),
        ],
    )
}

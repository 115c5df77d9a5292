//! Price Oracle - Asset registry and USD price feeds
//!
//! Holds the registry of assets the protocol accepts (native or CEP-18)
//! together with their USD price feeds. Prices are written by a single
//! configured publisher and rejected by readers once they exceed the
//! staleness window.

use super::errors::ProtocolError;
use super::events::*;
use crate::math::LoanMath;
use odra::casper_types::U256;
use odra::prelude::*;

/// How an asset is settled on chain
#[odra::odra_type]
pub enum AssetKind {
    /// The chain's native token
    Native,
    /// A CEP-18 token contract
    Token,
}

/// Registry entry for a supported asset
#[odra::odra_type]
pub struct AssetInfo {
    /// Registry identifier
    pub id: String,
    /// Settlement kind
    pub kind: AssetKind,
    /// Token contract address, present iff `kind` is `Token`
    pub token: Option<Address>,
    /// Asset decimals
    pub decimals: u8,
}

/// Price feed data for an asset
#[odra::odra_type]
pub struct PriceFeed {
    /// Registry identifier of the asset
    pub asset: String,
    /// USD price in feed units
    pub price_usd: U256,
    /// Feed decimals
    pub decimals: u8,
    /// Timestamp of the last update
    pub last_updated_at: u64,
}

/// Price returned to callers
#[odra::odra_type]
pub struct PriceQuote {
    /// USD price in feed units
    pub price_usd: U256,
    /// Feed decimals
    pub decimals: u8,
}

/// Price Oracle contract
#[odra::module]
pub struct PriceOracle {
    /// Registered assets by identifier
    assets: Mapping<String, AssetInfo>,

    /// Registration order, for enumeration
    asset_ids: Mapping<u32, String>,

    /// Number of registered assets
    asset_count: Var<u32>,

    /// Price feeds by asset identifier
    price_feeds: Mapping<String, PriceFeed>,

    /// Address allowed to publish prices
    publisher: Var<Address>,

    /// Admin address
    admin: Var<Address>,

    /// Maximum price age in milliseconds
    max_staleness_ms: Var<u64>,
}

#[odra::module]
impl PriceOracle {
    /// Initialize the oracle with a publisher and staleness window
    pub fn init(&mut self, publisher: Address, max_staleness_ms: u64) {
        let caller = self.env().caller();
        self.admin.set(caller);
        self.publisher.set(publisher);
        if max_staleness_ms == 0 {
            self.env().revert(ProtocolError::InvalidConfiguration);
        }
        self.max_staleness_ms.set(max_staleness_ms);
        self.asset_count.set(0);
    }

    // ========================================
    // Asset Registry
    // ========================================

    /// Register an asset (admin only)
    ///
    /// `token` must be present for token assets and absent for the native
    /// asset. Identifiers cannot be re-registered.
    pub fn register_asset(
        &mut self,
        id: String,
        kind: AssetKind,
        token: Option<Address>,
        decimals: u8,
    ) {
        self.only_admin();

        if self.assets.get(&id).is_some() {
            self.env().revert(ProtocolError::InvalidConfiguration);
        }
        match kind {
            AssetKind::Native => {
                if token.is_some() {
                    self.env().revert(ProtocolError::InvalidConfiguration);
                }
            }
            AssetKind::Token => {
                if token.is_none() {
                    self.env().revert(ProtocolError::InvalidConfiguration);
                }
            }
        }

        let info = AssetInfo {
            id: id.clone(),
            kind,
            token,
            decimals,
        };
        self.assets.set(&id, info);

        let count = self.asset_count.get_or_default();
        self.asset_ids.set(&count, id.clone());
        self.asset_count.set(count + 1);

        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        self.env().emit_event(AssetRegistered {
            asset: id,
            token,
            decimals,
            registered_by: admin,
        });
    }

    /// Get the registry entry for an asset
    pub fn asset_info(&self, id: String) -> AssetInfo {
        self.assets
            .get(&id)
            .unwrap_or_revert_with(&self.env(), ProtocolError::TokenNotSupported)
    }

    /// Whether an asset is registered
    pub fn is_supported(&self, id: String) -> bool {
        self.assets.get(&id).is_some()
    }

    /// List all registered asset identifiers
    pub fn supported_assets(&self) -> Vec<String> {
        let count = self.asset_count.get_or_default();
        let mut ids = Vec::new();
        for i in 0..count {
            if let Some(id) = self.asset_ids.get(&i) {
                ids.push(id);
            }
        }
        ids
    }

    // ========================================
    // Price Feeds
    // ========================================

    /// Publish a price for an asset (publisher only)
    pub fn publish_price(&mut self, asset: String, price_usd: U256, decimals: u8) {
        let caller = self.env().caller();
        let publisher = self
            .publisher
            .get_or_revert_with(ProtocolError::Unauthorized);
        if caller != publisher {
            self.env().revert(ProtocolError::Unauthorized);
        }

        if self.assets.get(&asset).is_none() {
            self.env().revert(ProtocolError::TokenNotSupported);
        }
        if price_usd.is_zero() {
            self.env().revert(ProtocolError::InvalidAmount);
        }

        let timestamp = self.env().get_block_time();
        let feed = PriceFeed {
            asset: asset.clone(),
            price_usd,
            decimals,
            last_updated_at: timestamp,
        };
        self.price_feeds.set(&asset, feed);

        self.env().emit_event(PricePublished {
            asset,
            price_usd,
            decimals,
            timestamp,
        });
    }

    /// Get the latest price for an asset
    ///
    /// Reverts with `TokenNotSupported` for unregistered assets and
    /// `StalePriceFeed` when the feed is missing or too old.
    pub fn get_latest_price(&self, asset: String) -> PriceQuote {
        if self.assets.get(&asset).is_none() {
            self.env().revert(ProtocolError::TokenNotSupported);
        }
        let feed = self
            .price_feeds
            .get(&asset)
            .unwrap_or_revert_with(&self.env(), ProtocolError::StalePriceFeed);

        let current_time = self.env().get_block_time();
        let max_staleness = self.max_staleness_ms.get_or_default();
        if current_time - feed.last_updated_at > max_staleness {
            self.env().revert(ProtocolError::StalePriceFeed);
        }

        PriceQuote {
            price_usd: feed.price_usd,
            decimals: feed.decimals,
        }
    }

    /// USD value of an asset amount, scaled by 1e18
    pub fn usd_value(&self, asset: String, amount: U256) -> U256 {
        let info = self.asset_info(asset.clone());
        let quote = self.get_latest_price(asset);
        LoanMath::usd_value(amount, quote.price_usd, quote.decimals, info.decimals)
            .unwrap_or_revert(&self.env())
    }

    // ========================================
    // Admin Functions
    // ========================================

    /// Rotate the publisher address (admin only)
    pub fn set_publisher(&mut self, new_publisher: Address) {
        self.only_admin();
        let old_publisher = self
            .publisher
            .get_or_revert_with(ProtocolError::Unauthorized);
        self.publisher.set(new_publisher);
        self.env().emit_event(PublisherChanged {
            old_publisher,
            new_publisher,
        });
    }

    /// Update the staleness window (admin only)
    pub fn set_max_staleness(&mut self, max_staleness_ms: u64) {
        self.only_admin();
        if max_staleness_ms == 0 {
            self.env().revert(ProtocolError::InvalidConfiguration);
        }
        let old_ms = self.max_staleness_ms.get_or_default();
        self.max_staleness_ms.set(max_staleness_ms);

        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        self.env().emit_event(MaxStalenessUpdated {
            old_ms,
            new_ms: max_staleness_ms,
            updated_by: admin,
        });
    }

    /// Get the publisher address
    pub fn get_publisher(&self) -> Address {
        self.publisher
            .get_or_revert_with(ProtocolError::Unauthorized)
    }

    /// Get the staleness window in milliseconds
    pub fn max_staleness(&self) -> u64 {
        self.max_staleness_ms.get_or_default()
    }

    /// Get the admin address
    pub fn get_admin(&self) -> Address {
        self.admin.get_or_revert_with(ProtocolError::Unauthorized)
    }

    fn only_admin(&self) {
        let caller = self.env().caller();
        let admin = self.admin.get_or_revert_with(ProtocolError::Unauthorized);
        if caller != admin {
            self.env().revert(ProtocolError::Unauthorized);
        }
    }
}

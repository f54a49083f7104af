//! Wallet/session and token-list signals the queries react to.

use {alloy_primitives::Address, tokio::sync::watch};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Session {
    pub account: Option<Address>,
    pub is_wallet_ready: bool,
    pub chain_id: u64,
}

impl Session {
    /// The connected account, if the wallet is ready.
    pub fn connected_account(&self) -> Option<Address> {
        self.account.filter(|_| self.is_wallet_ready)
    }
}

/// Whether the token list metadata has been loaded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TokenListsState {
    #[default]
    Loading,
    Loaded,
}

/// Owns the session and token-list signals.
pub struct SessionProvider {
    session: watch::Sender<Session>,
    token_lists: watch::Sender<TokenListsState>,
}

impl SessionProvider {
    pub fn new(chain_id: u64) -> Self {
        let (session, _) = watch::channel(Session {
            chain_id,
            ..Default::default()
        });
        let (token_lists, _) = watch::channel(TokenListsState::Loading);
        Self {
            session,
            token_lists,
        }
    }

    pub fn connect(&self, account: Address) {
        tracing::debug!(%account, "wallet connected");
        self.session.send_modify(|session| {
            session.account = Some(account);
            session.is_wallet_ready = true;
        });
    }

    pub fn disconnect(&self) {
        tracing::debug!("wallet disconnected");
        self.session.send_modify(|session| {
            session.account = None;
            session.is_wallet_ready = false;
        });
    }

    pub fn switch_chain(&self, chain_id: u64) {
        self.session.send_if_modified(|session| {
            std::mem::replace(&mut session.chain_id, chain_id) != chain_id
        });
    }

    pub fn set_token_lists(&self, state: TokenListsState) {
        self.token_lists.send_if_modified(|current| {
            let modified = *current != state;
            *current = state;
            modified
        });
    }

    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn subscribe_token_lists(&self) -> watch::Receiver<TokenListsState> {
        self.token_lists.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_account_requires_ready_wallet() {
        let account = Address::repeat_byte(1);
        let session = Session {
            account: Some(account),
            is_wallet_ready: false,
            chain_id: 250,
        };
        assert_eq!(session.connected_account(), None);
        assert_eq!(
            Session {
                is_wallet_ready: true,
                ..session
            }
            .connected_account(),
            Some(account),
        );
    }

    #[test]
    fn provider_updates_signals() {
        let provider = SessionProvider::new(250);
        let mut session = provider.subscribe();
        let lists = provider.subscribe_token_lists();

        provider.connect(Address::repeat_byte(2));
        assert!(session.has_changed().unwrap());
        assert_eq!(
            session.borrow_and_update().connected_account(),
            Some(Address::repeat_byte(2))
        );

        provider.switch_chain(250);
        assert!(!session.has_changed().unwrap());

        provider.set_token_lists(TokenListsState::Loaded);
        assert_eq!(*lists.borrow(), TokenListsState::Loaded);

        provider.disconnect();
        assert_eq!(provider.session().account, None);
    }
}

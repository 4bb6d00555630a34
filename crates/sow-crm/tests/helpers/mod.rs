pub mod mock_crm_server;

pub mod http_whatsapp_service;
